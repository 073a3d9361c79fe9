//! A throwaway Neo4j for the live store tests.

use glasspane_common::Neo4jConfig;
use testcontainers::{
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use crate::GraphClient;

const BOLT_PORT: u16 = 7687;
const TEST_PASSWORD: &str = "glasspane-test";

fn config_for_port(host_port: u16) -> Neo4jConfig {
    Neo4jConfig {
        uri: format!("bolt://127.0.0.1:{host_port}"),
        user: "neo4j".to_string(),
        password: TEST_PASSWORD.to_string(),
        database: "neo4j".to_string(),
    }
}

/// Start a community Neo4j and connect to it.
///
/// Keep the returned container alive for the whole test; dropping it stops
/// the database.
pub async fn neo4j_container() -> (ContainerAsync<GenericImage>, GraphClient) {
    let container = GenericImage::new("neo4j", "5.25.1-community")
        .with_exposed_port(ContainerPort::Tcp(BOLT_PORT))
        .with_wait_for(WaitFor::message_on_stdout("Started."))
        .with_env_var("NEO4J_AUTH", format!("neo4j/{TEST_PASSWORD}"))
        .start()
        .await
        .expect("neo4j container should start");

    let host_port = container
        .get_host_port_ipv4(BOLT_PORT)
        .await
        .expect("bolt port should be mapped");

    let client = GraphClient::connect(&config_for_port(host_port))
        .await
        .expect("neo4j should accept the test credentials");

    (container, client)
}

//! bank2pc demo entry point.
//!
//! Process bootstrap, port binding, and container orchestration are out
//! of scope for this binary: it wires a coordinator and a handful of
//! in-process participants together and drives a few illustrative
//! transactions, rather than serving real RPC traffic.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bank2pc::config::ParticipantConfig;
use bank2pc::coordinator::{Coordinator, CreateAccountRequest};
use bank2pc::participant::ParticipantHandler;
use bank2pc::rpc::flaky::FlakyParticipantClient;
use bank2pc::rpc::local::LocalParticipantClient;
use bank2pc::rpc::pool::BoundedParticipantClient;
use bank2pc::rpc::ParticipantClient;
use clap::{Arg, Command};

#[tokio::main]
async fn main() -> Result<()> {
    bank2pc::telemetry::init();

    let matches = Command::new("bank2pc")
        .version("0.1.0")
        .about("Two-phase commit core for distributed account creation")
        .arg(
            Arg::new("participants")
                .long("participants")
                .value_name("N")
                .help("Number of in-process participant nodes")
                .default_value("3"),
        )
        .arg(
            Arg::new("fail-last")
                .long("fail-last")
                .help("Simulate the last participant being unreachable")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let participant_count: usize = matches
        .get_one::<String>("participants")
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);
    let fail_last = matches.get_flag("fail-last");

    println!("bank2pc demo: {participant_count} participant(s), fail_last={fail_last}");

    let mut participants: Vec<Arc<dyn ParticipantClient>> = Vec::new();
    for i in 1..=participant_count {
        let config = ParticipantConfig {
            node_id: format!("participant-{i}"),
            ..ParticipantConfig::default()
        };
        let handler = Arc::new(ParticipantHandler::new(config.node_id.clone()));
        let client = LocalParticipantClient::new(handler);
        if fail_last && i == participant_count {
            let flaky = FlakyParticipantClient::new(client);
            flaky.set_down(true);
            let bounded = BoundedParticipantClient::new(flaky, config.worker_pool_size);
            participants.push(Arc::new(bounded));
        } else {
            let bounded = BoundedParticipantClient::new(client, config.worker_pool_size);
            participants.push(Arc::new(bounded));
        }
    }

    let coordinator = Coordinator::new(participants, Duration::from_millis(2000));

    let scenarios = vec![
        ("alice@example.com", "Alice", 100.0),
        ("bob@example.com", "Bob", 250.0),
        ("alice@example.com", "Alice Again", 10.0), // expected conflict
    ];

    for (email, name, balance) in scenarios {
        let resp = coordinator
            .create_account(CreateAccountRequest {
                name: name.to_string(),
                email: email.to_string(),
                initial_balance: balance,
            })
            .await;
        if resp.success {
            println!("CreateAccount({email}) -> success: {}", resp.message);
        } else {
            println!("CreateAccount({email}) -> aborted: {}", resp.message);
        }
    }

    Ok(())
}

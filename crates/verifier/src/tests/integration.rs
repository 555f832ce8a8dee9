//! Verification runs over simulated bridge deployments.

use super::fixtures::*;
use crate::{
    client::{ChainClient, RpcChainClient},
    config::VerifierConfig,
    pair::PairDescriptor,
    registry::EndpointRegistry,
    report::ExitStatus,
    retry::RetryPolicy,
    verifier::{Outcome, PairVerifier},
};
use alloy::primitives::{Address, U256};
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use supply_audit_primitives::{ChainAddress, ether_to_wei};

mod ether_burn {
    use super::*;

    #[tokio::test]
    async fn test_conserved_supply_passes() {
        let deployment = BridgeDeployment::new();
        deployment.bridge_ether(U256::from(500), U256::from(500));
        let registry = deployment.registry();

        let report = PairVerifier::new(&registry)
            .verify_all(&[ether_pair()], 1)
            .await;

        let result = &report.results()[0];
        assert_eq!(result.equal(), Some(true));
        assert_eq!(
            result.outcome,
            Outcome::Conserved {
                amount: U256::from(500)
            }
        );
        assert_eq!(result.wrapped_token, Some(WRAPPED_ETHER));
        assert_eq!(result.escrowed_token, None);
        assert!(report.valid());
    }

    #[tokio::test]
    async fn test_under_minted_supply_fails() {
        let deployment = BridgeDeployment::new();
        deployment.bridge_ether(U256::from(500), U256::from(400));
        let registry = deployment.registry();

        let report = PairVerifier::new(&registry)
            .verify_all(&[ether_pair()], 1)
            .await;

        assert_eq!(
            report.results()[0].outcome,
            Outcome::Mismatch {
                source: U256::from(500),
                destination: U256::from(400),
            }
        );
        assert!(!report.valid());
        assert_eq!(report.exit_status(), ExitStatus::Mismatch);
    }

    #[tokio::test]
    async fn test_off_by_one_wei_fails() {
        let locked = ether_to_wei("10000").unwrap();

        let deployment = BridgeDeployment::new();
        deployment.bridge_ether(locked, locked + U256::from(1));
        let registry = deployment.registry();

        let result = PairVerifier::new(&registry).verify(&ether_pair()).await;
        assert_eq!(result.equal(), Some(false));
    }

    #[tokio::test]
    async fn test_failed_balance_call_is_not_zero() {
        let deployment = BridgeDeployment::new();
        // a zero-valued read would wrongly match the empty wrapped supply
        deployment.bridge_ether(U256::ZERO, U256::ZERO);
        deployment
            .origin
            .fail_calls_to(ETHER_LOCK, "connection refused");
        let registry = deployment.registry();

        let result = PairVerifier::new(&registry).verify(&ether_pair()).await;

        assert_eq!(result.equal(), None);
        let Outcome::Indeterminate { reason } = &result.outcome else {
            panic!("expected an indeterminate outcome, got {:?}", result.outcome);
        };
        assert!(reason.contains("sepolia"), "{reason}");
        assert!(reason.contains("connection refused"), "{reason}");
    }
}

mod token_burn {
    use super::*;

    #[tokio::test]
    async fn test_conserved_supply_passes() {
        let deployment = BridgeDeployment::new();
        deployment.bridge_usdc(U256::from(1000), U256::from(1000));
        let registry = deployment.registry();

        let report = PairVerifier::new(&registry)
            .verify_all(&[usdc_pair()], 1)
            .await;

        let result = &report.results()[0];
        assert_eq!(result.equal(), Some(true));
        assert_eq!(result.escrowed_token, Some(USDC));
        assert_eq!(result.wrapped_token, Some(WRAPPED_USDC));
        assert_eq!(report.exit_status(), ExitStatus::Conserved);
    }

    #[tokio::test]
    async fn test_drained_escrow_is_flagged_by_name() {
        let deployment = BridgeDeployment::new();
        deployment.bridge_usdc(U256::from(999), U256::from(1000));
        let registry = deployment.registry();

        let report = PairVerifier::new(&registry)
            .verify_all(&[ether_pair(), usdc_pair()], 1)
            .await;

        assert!(!report.valid());
        assert_eq!(report.mismatched_pairs(), ["USDC"]);

        let mut out = Vec::new();
        report.write_table(&mut out).unwrap();
        let table = String::from_utf8(out).unwrap();
        assert!(table.contains("[MISMATCH] USDC (token-burn)"), "{table}");
        assert!(table.contains("Mismatched pairs: USDC"), "{table}");
    }

    #[tokio::test]
    async fn test_only_locker_balance_counts_as_escrow() {
        let deployment = BridgeDeployment::new();
        deployment.bridge_usdc(U256::from(1000), U256::from(1000));
        // USDC held elsewhere on the origin chain is not escrow
        deployment
            .origin
            .set_token_balance(USDC, Address::repeat_byte(0x77), U256::from(5_000));
        let registry = deployment.registry();

        let result = PairVerifier::new(&registry).verify(&usdc_pair()).await;
        assert_eq!(result.equal(), Some(true));
    }

    #[tokio::test]
    async fn test_reverting_burner_is_indeterminate() {
        let deployment = BridgeDeployment::new();
        deployment.bridge_usdc(U256::from(1000), U256::from(1000));
        let registry = deployment.registry();

        let pair = PairDescriptor::TokenBurn(crate::pair::TokenBurnPair {
            name: "USDC".to_string(),
            locker: ChainAddress::new(ORIGIN, USDC_LOCKER),
            burner: ChainAddress::new(DESTINATION, Address::repeat_byte(0xDE)),
        });

        let result = PairVerifier::new(&registry).verify(&pair).await;
        assert_eq!(result.equal(), None);
        assert_eq!(result.wrapped_token, None);
    }
}

mod run {
    use super::*;

    fn healthy_deployment() -> BridgeDeployment {
        let deployment = BridgeDeployment::new();
        let ether = ether_to_wei("12.5").unwrap();
        deployment.bridge_ether(ether, ether);
        deployment.bridge_usdc(U256::from(1_000_000), U256::from(1_000_000));
        deployment
    }

    #[tokio::test]
    async fn test_repeated_runs_are_identical() {
        let deployment = healthy_deployment();
        let registry = deployment.registry();
        let verifier = PairVerifier::new(&registry);
        let catalog = [ether_pair(), usdc_pair()];

        let first = verifier.verify_all(&catalog, 1).await;
        let second = verifier.verify_all(&catalog, 1).await;

        assert_eq!(first, second);
        assert!(first.valid());
    }

    #[tokio::test]
    async fn test_unavailable_endpoint_only_affects_its_pairs() {
        let deployment = healthy_deployment();

        let mut registry = EndpointRegistry::new();
        registry.insert_client(ORIGIN, deployment.origin.clone());
        registry.insert_client(DESTINATION, deployment.destination.clone());
        registry.insert_client("other", Arc::new(MockChain::new(1)));
        registry.insert_unavailable("holesky", "connection refused");

        let stranded = PairDescriptor::EtherBurn(crate::pair::EtherBurnPair {
            name: "HOLESKY-ETH".to_string(),
            ether: ChainAddress::new("holesky", ETHER_LOCK),
            burner: ChainAddress::new(DESTINATION, ETHER_BURNER),
        });

        let report = PairVerifier::new(&registry)
            .verify_all(&[ether_pair(), stranded, usdc_pair()], 1)
            .await;

        let equal: Vec<_> = report.results().iter().map(|r| r.equal()).collect();
        assert_eq!(equal, [Some(true), None, Some(true)]);
        assert!(report.valid());
        assert_eq!(report.indeterminate(), 1);
        assert_eq!(report.exit_status(), ExitStatus::Indeterminate);
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_indeterminate_at_runtime() {
        let deployment = healthy_deployment();
        let mut registry = EndpointRegistry::new();
        registry.insert_client(DESTINATION, deployment.destination.clone());

        let result = PairVerifier::new(&registry).verify(&usdc_pair()).await;
        assert!(matches!(
            &result.outcome,
            Outcome::Indeterminate { reason } if reason == "unknown endpoint `sepolia`"
        ));
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_catalog_order() {
        let deployment = healthy_deployment();
        // the first pair finishes last
        deployment
            .origin
            .delay_calls_to(ETHER_LOCK, Duration::from_millis(50));
        let registry = deployment.registry();

        let report = PairVerifier::new(&registry)
            .verify_all(&[ether_pair(), usdc_pair()], 4)
            .await;

        let names: Vec<_> = report.results().iter().map(|r| r.pair.as_str()).collect();
        assert_eq!(names, ["ETH", "USDC"]);
        assert!(report.valid());
    }

    #[tokio::test]
    async fn test_each_pair_is_checked_once() {
        let deployment = healthy_deployment();
        let registry = deployment.registry();

        PairVerifier::new(&registry)
            .verify_all(&[ether_pair(), usdc_pair()], 2)
            .await;

        // native balance; token() and balanceOf on the locker side
        assert_eq!(deployment.origin.calls(), 3);
        // token() and totalSupply() for each burner
        assert_eq!(deployment.destination.calls(), 4);
    }

    #[tokio::test]
    async fn test_catalog_from_config() {
        let deployment = healthy_deployment();
        let registry = deployment.registry();

        let config = VerifierConfig::from_toml(&format!(
            r#"
[endpoints]
{ORIGIN} = "http://localhost:8545"
{DESTINATION} = "http://localhost:9545"

[[pairs]]
kind = "ether-burn"
name = "ETH"
ether = {{ chain = "{ORIGIN}", address = "{ETHER_LOCK}" }}
burner = {{ chain = "{DESTINATION}", address = "{ETHER_BURNER}" }}

[[pairs]]
kind = "token-burn"
name = "USDC"
locker = {{ chain = "{ORIGIN}", address = "{USDC_LOCKER}" }}
burner = {{ chain = "{DESTINATION}", address = "{USDC_BURNER}" }}
"#
        ))
        .unwrap();

        assert_eq!(config.pairs, [ether_pair(), usdc_pair()]);

        let report = PairVerifier::new(&registry)
            .verify_all(&config.pairs, config.concurrency)
            .await;
        assert_eq!(report.conserved(), 2);
    }
}

mod observability {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    fn counter_value(rendered: &str, name: &str) -> Option<u64> {
        rendered
            .lines()
            .filter(|line| !line.starts_with('#'))
            .find_map(|line| {
                let (metric, value) = line.split_once(' ')?;
                (metric == name || metric == format!("{name}_total"))
                    .then(|| value.trim().parse().ok())
                    .flatten()
            })
    }

    #[tokio::test]
    async fn test_outcomes_are_counted() {
        let deployment = BridgeDeployment::new();
        deployment.bridge_ether(U256::from(500), U256::from(500));
        deployment.bridge_usdc(U256::from(999), U256::from(1000));
        let registry = deployment.registry();

        let stranded = PairDescriptor::EtherBurn(crate::pair::EtherBurnPair {
            name: "HOLESKY-ETH".to_string(),
            ether: ChainAddress::new("holesky", ETHER_LOCK),
            burner: ChainAddress::new(DESTINATION, ETHER_BURNER),
        });

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let verifier = ::metrics::with_local_recorder(&recorder, || PairVerifier::new(&registry));

        verifier
            .verify_all(&[ether_pair(), usdc_pair(), stranded], 1)
            .await;

        let rendered = handle.render();
        assert_eq!(counter_value(&rendered, "supply_audit_pairs_verified"), Some(3), "{rendered}");
        assert_eq!(counter_value(&rendered, "supply_audit_pairs_conserved"), Some(1));
        assert_eq!(counter_value(&rendered, "supply_audit_pairs_mismatched"), Some(1));
        assert_eq!(counter_value(&rendered, "supply_audit_pairs_indeterminate"), Some(1));
    }
}

mod anvil {
    use super::*;
    use alloy::node_bindings::Anvil;

    #[tokio::test]
    #[ignore = "requires anvil"]
    async fn test_native_balance_of_funded_account() {
        let anvil = Anvil::new().spawn();

        let client = RpcChainClient::connect("anvil", &anvil.endpoint(), RetryPolicy::default())
            .await
            .unwrap();

        let head = client.head().await.unwrap();
        assert_eq!(head.chain_id, anvil.chain_id());

        let balance = client.native_balance(anvil.addresses()[0]).await.unwrap();
        assert_eq!(balance, ether_to_wei("10000").unwrap());
    }

    #[tokio::test]
    #[ignore = "requires anvil"]
    async fn test_missing_contract_is_indeterminate() {
        let anvil = Anvil::new().spawn();

        let endpoints: BTreeMap<String, String> = [
            (ORIGIN.to_string(), anvil.endpoint()),
            (DESTINATION.to_string(), anvil.endpoint()),
        ]
        .into_iter()
        .collect();
        let registry = EndpointRegistry::connect(&endpoints, RetryPolicy::no_retries()).await;

        let result = PairVerifier::new(&registry).verify(&usdc_pair()).await;
        assert_eq!(result.equal(), None);
    }
}

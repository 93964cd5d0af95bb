// End-to-end exchanges between nodes sharing one medium

use crate::support::{assert_converged, settle, shutdown_all, wait_for_rejections};
use coinmesh::identity::{Keypair, Signer};
use coinmesh::ledger::{ChainError, ChainHash, Coin, LedgerEntry, GENESIS_HASH};
use coinmesh::node::{CoinExchanger, ExchangerBuilder, ExchangerError};
use coinmesh::sync::LocalMedium;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_nodes_exchange() {
    let medium = Arc::new(LocalMedium::new());
    let p1 = CoinExchanger::start("n1", medium.clone()).await.unwrap();
    let p2 = CoinExchanger::start("n2", medium.clone()).await.unwrap();

    p1.send_coin("n2", 3).await.unwrap();
    settle(&[&p1, &p2], 1).await;
    assert_eq!(p1.balance_of("n1").await, -3);
    assert_eq!(p2.balance_of("n2").await, 3);

    p2.send_coin("n1", 7).await.unwrap();
    settle(&[&p1, &p2], 2).await;

    shutdown_all(&[&p1, &p2]).await;

    assert_converged(&[&p1, &p2]).await;
    assert_eq!(p1.balance_of("n1").await, 4);
    assert_eq!(p2.balance_of("n2").await, -4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_three_nodes_cascade() {
    let medium = Arc::new(LocalMedium::new());
    let p1 = CoinExchanger::start("n1", medium.clone()).await.unwrap();
    let p2 = CoinExchanger::start("n2", medium.clone()).await.unwrap();
    let p3 = CoinExchanger::start("n3", medium.clone()).await.unwrap();
    let all = [&p1, &p2, &p3];

    p1.send_coin("n2", 3).await.unwrap();
    settle(&all, 1).await;

    p2.send_coin("n3", 7).await.unwrap();
    settle(&all, 2).await;

    p3.send_coin("n1", 11).await.unwrap();
    settle(&all, 3).await;

    shutdown_all(&all).await;

    assert_converged(&all).await;
    for node in all {
        assert_eq!(node.balance_of("n1").await, 8);
        assert_eq!(node.balance_of("n2").await, -4);
        assert_eq!(node.balance_of("n3").await, -4);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bad_signature_rejected_everywhere() {
    let medium = Arc::new(LocalMedium::new());
    let rogue = Arc::new(Keypair::generate());
    let p1 = ExchangerBuilder::new("n1")
        .signer(rogue.clone())
        .start(medium.clone())
        .await
        .unwrap();
    let p2 = CoinExchanger::start("n2", medium.clone()).await.unwrap();
    let p3 = CoinExchanger::start("n3", medium.clone()).await.unwrap();
    let all = [&p1, &p2, &p3];

    // The sender's own chain refuses the entry, so nothing is broadcast.
    let result = p1.send_coin("n2", 10).await;
    assert!(matches!(
        result,
        Err(ExchangerError::Rejected(ChainError::InvalidSignature(ref name))) if name == "n1"
    ));

    // Pushed onto the wire anyway, every peer still refuses it.
    let forged = LedgerEntry::sign(Coin::new("n1", "n2", "", 10), &GENESIS_HASH, &*rogue)
        .unwrap();
    p1.relay_entry(forged).await.unwrap();
    wait_for_rejections(&p2, 1).await;
    wait_for_rejections(&p3, 1).await;

    p2.send_coin("n3", 2).await.unwrap();
    settle(&all, 1).await;

    shutdown_all(&all).await;

    assert_converged(&all).await;
    assert_eq!(p1.balance_of("n1").await, 0);
    assert_eq!(p2.balance_of("n2").await, -2);
    assert_eq!(p3.balance_of("n3").await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bad_hash_rejected_then_chain_continues() {
    let medium = Arc::new(LocalMedium::new());
    let n1_key = Keypair::generate();
    let p1 = ExchangerBuilder::new("n1")
        .keypair(n1_key.clone())
        .start(medium.clone())
        .await
        .unwrap();
    let p2 = CoinExchanger::start("n2", medium.clone()).await.unwrap();

    p1.send_coin("n2", 10).await.unwrap();
    settle(&[&p1, &p2], 1).await;

    let mut bogus = [0u8; 32];
    bogus[..23].copy_from_slice(b"This is a VERY bad hash");
    let bogus = ChainHash::from_bytes(bogus);
    let signature = n1_key.sign(bogus.as_bytes()).unwrap();
    let bad = LedgerEntry::from_parts(Coin::new("n1", "n2", "Please reject me!", 10), bogus, signature);
    p1.relay_entry(bad).await.unwrap();
    wait_for_rejections(&p2, 1).await;
    assert_eq!(p2.chain_len().await, 1);

    p1.send_coin("n2", 20).await.unwrap();
    settle(&[&p1, &p2], 2).await;

    shutdown_all(&[&p1, &p2]).await;

    assert_converged(&[&p1, &p2]).await;
    assert_eq!(p2.balance_of("n2").await, 30);
    assert_eq!(p1.balance_of("n1").await, -30);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sends_from_one_node_stay_ordered() {
    let medium = Arc::new(LocalMedium::new());
    let p1 = Arc::new(CoinExchanger::start("n1", medium.clone()).await.unwrap());
    let p2 = CoinExchanger::start("n2", medium.clone()).await.unwrap();

    let handles: Vec<_> = (1..=20)
        .map(|amount| {
            let p1 = p1.clone();
            tokio::spawn(async move { p1.send_coin("n2", amount).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    settle(&[&*p1, &p2], 20).await;
    shutdown_all(&[&*p1, &p2]).await;

    assert_converged(&[&*p1, &p2]).await;
    assert_eq!(p2.balance_of("n2").await, (1..=20).sum::<i64>());
    assert_eq!(p2.stats().entries_rejected, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_alternating_senders_converge() {
    let medium = Arc::new(LocalMedium::new());
    let p1 = CoinExchanger::start("n1", medium.clone()).await.unwrap();
    let p2 = CoinExchanger::start("n2", medium.clone()).await.unwrap();
    let p3 = CoinExchanger::start("n3", medium.clone()).await.unwrap();
    let all = [&p1, &p2, &p3];

    for round in 0..10 {
        let sender = all[round % 3];
        let receiver = all[(round + 1) % 3].name().to_string();
        sender.send_coin(&receiver, round as i64 + 1).await.unwrap();
        settle(&all, round + 1).await;
    }

    shutdown_all(&all).await;

    assert_converged(&all).await;
    let chain = p1.chain().await;
    assert_eq!(chain.balances().values().sum::<i64>(), 0);
    for name in ["n1", "n2", "n3"] {
        assert_eq!(chain.balance_of(name), chain.replay_balance_of(name));
    }
}

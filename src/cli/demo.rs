use log::info;

use std::io::Write;
use std::time::Instant;

use super::{write_balances, write_chain, write_chain_json};
use crate::ledger::{Address, Ledger, Sender};

/// Runs the scripted walkthrough against `ledger`
///
/// Grants coins to Alice and Bob, moves some between accounts, seals two
/// blocks, prints the chain and balances, then shows an overdraft being
/// rejected.
pub fn run_demo<W: Write>(ledger: &mut Ledger, out: &mut W, json: bool) -> anyhow::Result<()> {
    let total_start = Instant::now();

    let alice = Address::new("Alice")?;
    let bob = Address::new("Bob")?;
    let charlie = Address::new("Charlie")?;

    ledger.submit(Sender::Issuance, alice.clone(), 100.0)?;
    ledger.submit(Sender::Issuance, bob.clone(), 50.0)?;

    writeln!(out, "Initial Transactions:")?;
    for tx in [
        ledger.submit(Sender::Account(alice.clone()), bob.clone(), 20.0)?,
        ledger.submit(Sender::Account(bob.clone()), charlie.clone(), 15.0)?,
    ] {
        writeln!(out, "  {}", tx)?;
    }

    writeln!(out, "\nMining Blocks:")?;
    let miners = [Address::new("Miner1")?, Address::new("Miner2")?];
    for miner in &miners {
        let start = Instant::now();
        let block = ledger.seal(miner)?;
        writeln!(
            out,
            "Block #{} mined by {} (Time: {:?})",
            block.index(),
            miner,
            start.elapsed()
        )?;
    }

    if json {
        write_chain_json(ledger, out)?;
    } else {
        write_chain(ledger, out)?;
    }
    write_balances(ledger, out)?;

    writeln!(out, "\nBalance Checks:")?;
    for account in [&alice, &bob, &charlie, &miners[0], &miners[1]] {
        writeln!(
            out,
            "{}'s Balance: {} coins",
            account,
            ledger.balance_of(account.as_str())
        )?;
    }

    writeln!(out, "\nTransaction Validation Test:")?;
    match ledger.submit(Sender::Account(alice.clone()), bob.clone(), 1000.0) {
        Ok(_) => writeln!(out, "Transaction succeeded")?,
        Err(e) => writeln!(out, "Transaction failed: {}", e)?,
    }

    let total = total_start.elapsed();
    info!("Demo finished in {:?}", total);
    writeln!(out, "\nTotal Simulation Runtime: {:?}", total)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_final_state() {
        let mut ledger = Ledger::new();
        let mut out = Vec::new();

        run_demo(&mut ledger, &mut out, false).unwrap();

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.balance_of("Alice"), 80.0);
        assert_eq!(ledger.balance_of("Bob"), 55.0);
        assert_eq!(ledger.balance_of("Charlie"), 15.0);
        assert_eq!(ledger.balance_of("Miner1"), 10.0);
        assert_eq!(ledger.balance_of("Miner2"), 10.0);
        assert!(ledger.is_valid());

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Alice's Balance: 80 coins"));
        assert!(text.contains("Transaction failed: Account error: Insufficient funds"));
    }

    #[test]
    fn test_demo_json_output() {
        let mut ledger = Ledger::new();
        let mut out = Vec::new();

        run_demo(&mut ledger, &mut out, true).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"previous_hash\""));
        assert!(!text.contains("Blockchain Ledger:"));
    }
}

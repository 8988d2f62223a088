// CLI module
//
// Drivers that sit on top of the ledger: an interactive REPL and the
// scripted demo. Neither keeps any ledger state of its own.

pub mod demo;
pub mod repl;

use std::io::Write;

use crate::ledger::Ledger;

// Re-export main components for easier access
pub use demo::run_demo;
pub use repl::Repl;

/// Writes every block in the chain, genesis first
pub fn write_chain<W: Write>(ledger: &Ledger, out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "Blockchain Ledger:")?;
    for block in ledger.chain() {
        writeln!(out, "{}", block)?;
        writeln!(out)?;
    }

    Ok(())
}

/// Writes the chain summaries as pretty JSON
pub fn write_chain_json<W: Write>(ledger: &Ledger, out: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &ledger.render_chain())?;
    writeln!(out)?;

    Ok(())
}

/// Writes every account balance, sorted by account
pub fn write_balances<W: Write>(ledger: &Ledger, out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "\nCurrent Account Balances:")?;
    for (address, balance) in ledger.render_balances() {
        writeln!(out, "{}: {} coins", address, balance)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Address, Sender};

    #[test]
    fn test_write_balances_sorted() {
        let mut ledger = Ledger::new();
        ledger.submit(Sender::Issuance, Address::new("Zed").unwrap(), 5.0).unwrap();
        ledger.submit(Sender::Issuance, Address::new("Amy").unwrap(), 7.5).unwrap();

        let mut out = Vec::new();
        write_balances(&ledger, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nCurrent Account Balances:\nAmy: 7.5 coins\nZed: 5 coins\n"
        );
    }

    #[test]
    fn test_write_chain_json_parses() {
        let ledger = Ledger::new();

        let mut out = Vec::new();
        write_chain_json(&ledger, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["index"], 0);
        assert_eq!(value[0]["hash"], "0");
    }
}

use anyhow::Context;
use log::debug;

use std::io::{BufRead, Write};
use std::str::FromStr;
use std::time::Instant;

use super::{write_balances, write_chain};
use crate::ledger::{Address, Ledger, Sender};

const PROMPT: &str = ">>>";

/// A REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    AddPerson,
    AddTransaction,
    MineBlock,
    DisplayChain,
    DisplayBalances,
    Unknown(String),
}

impl FromStr for Command {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "help" => Command::Help,
            "exit" => Command::Exit,
            "add-person" => Command::AddPerson,
            "add-transaction" => Command::AddTransaction,
            "mine-block" => Command::MineBlock,
            "display-chain" => Command::DisplayChain,
            "display-balances" => Command::DisplayBalances,
            other => Command::Unknown(other.to_string()),
        })
    }
}

/// Interactive driver reading commands from `input` and writing to `output`
pub struct Repl<R, W> {
    ledger: Ledger,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(ledger: Ledger, input: R, output: W) -> Self {
        Repl {
            ledger,
            input,
            output,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Runs until `exit` or end of input
    pub fn run(&mut self) -> anyhow::Result<()> {
        while let Some(line) = self.prompt(PROMPT)? {
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(never) => match never {},
            };
            debug!("REPL command: {:?}", command);

            if command == Command::Exit {
                break;
            }
            self.execute(command)?;
        }

        Ok(())
    }

    fn execute(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Help => self.help()?,
            Command::Exit => {}
            Command::AddPerson => self.add_person()?,
            Command::AddTransaction => self.add_transaction()?,
            Command::MineBlock => self.mine_block()?,
            Command::DisplayChain => write_chain(&self.ledger, &mut self.output)?,
            Command::DisplayBalances => write_balances(&self.ledger, &mut self.output)?,
            Command::Unknown(_) => writeln!(
                self.output,
                "Invalid command. Type 'help' for a list of available commands."
            )?,
        }

        Ok(())
    }

    fn help(&mut self) -> anyhow::Result<()> {
        writeln!(self.output, "Available commands:")?;
        for name in [
            "help",
            "exit",
            "add-person",
            "add-transaction",
            "mine-block",
            "display-chain",
            "display-balances",
        ] {
            writeln!(self.output, "{}", name)?;
        }

        Ok(())
    }

    fn add_person(&mut self) -> anyhow::Result<()> {
        let Some(name) = self.prompt("Enter the name of the person: ")? else {
            return Ok(());
        };

        let grant = self.ledger.config().person_grant;
        let result = Address::new(name.trim())
            .map_err(Into::into)
            .and_then(|address| self.ledger.submit(Sender::Issuance, address, grant));
        self.report(result.map(|tx| format!("Transaction added: {}", tx)))
    }

    fn add_transaction(&mut self) -> anyhow::Result<()> {
        let Some(sender) = self.prompt("Enter the sender's name: ")? else {
            return Ok(());
        };
        let Some(receiver) = self.prompt("Enter the recipient's name: ")? else {
            return Ok(());
        };
        let Some(amount) = self.prompt("Enter the transaction amount: ")? else {
            return Ok(());
        };

        let amount = match amount.trim().parse::<f64>() {
            Ok(amount) => amount,
            Err(_) => {
                writeln!(self.output, "Invalid amount: `{}` is not a number", amount.trim())?;
                return Ok(());
            }
        };

        let result = self
            .ledger
            .submit_named(sender.trim(), receiver.trim(), amount);
        self.report(result.map(|tx| format!("Transaction added: {}", tx)))
    }

    fn mine_block(&mut self) -> anyhow::Result<()> {
        let miner = Address::new(self.ledger.config().miner_name.clone())?;

        let start = Instant::now();
        let result = self.ledger.seal(&miner);
        let elapsed = start.elapsed();

        self.report(result.map(|block| {
            format!(
                "Block #{} mined by {} (Time: {:.2} seconds)",
                block.index(),
                miner,
                elapsed.as_secs_f64()
            )
        }))
    }

    fn report<E: std::fmt::Display>(&mut self, result: Result<String, E>) -> anyhow::Result<()> {
        match result {
            Ok(message) => writeln!(self.output, "{}", message)?,
            Err(err) => writeln!(self.output, "Error: {}", err)?,
        }

        Ok(())
    }

    /// Writes `message` and reads one line; `None` at end of input
    fn prompt(&mut self, message: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush().context("Failed to flush output")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

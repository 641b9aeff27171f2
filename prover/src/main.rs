//! `spymaster-prover` command line.
//!
//! Produces certificates for `SpyMaster::set_last_message` without revealing
//! the message body on-chain.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codec::Encode;
use sp_core::{crypto::ByteArray, hexdisplay::HexDisplay};
use spymaster_primitives::{AgentRecord, Message, MessageBody, SecurityCode};
use spymaster_prover::Prover;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Off-chain prover for SpyMaster message certificates.
#[derive(Debug, Parser)]
#[command(name = "spymaster-prover", version, about)]
struct Cli {
    /// Log filter (e.g. `info`, `spymaster_prover=debug`).
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the prover's public key (configure the runtime with it).
    Public {
        /// Secret URI of the prover key.
        #[arg(long)]
        suri: String,
    },
    /// Validate a message against an agent record and print the
    /// SCALE-encoded certificate as hex.
    Prove {
        /// Secret URI of the prover key.
        #[arg(long)]
        suri: String,
        /// Agent the message belongs to.
        #[arg(long)]
        agent_id: u64,
        /// Security code currently registered for the agent, as `A,B`.
        #[arg(long, value_parser = parse_security_code)]
        code: SecurityCode,
        /// Agent's current `last_message`.
        #[arg(long, default_value_t = 0)]
        last_message: u64,
        /// Number of the message being certified.
        #[arg(long)]
        message_number: u64,
        /// Message body; each byte is one symbol.
        #[arg(long)]
        body: String,
        /// Security code carried by the message, if different from `--code`.
        #[arg(long, value_parser = parse_security_code)]
        message_code: Option<SecurityCode>,
    },
}

/// Accepts `97,98` or a two-character string such as `ab`.
fn parse_security_code(s: &str) -> Result<SecurityCode, String> {
    if let Some((a, b)) = s.split_once(',') {
        let char0 = a.trim().parse::<u8>().map_err(|e| format!("bad first symbol: {e}"))?;
        let char1 = b.trim().parse::<u8>().map_err(|e| format!("bad second symbol: {e}"))?;
        return Ok(SecurityCode::new(char0, char1));
    }
    match s.as_bytes() {
        [a, b] => Ok(SecurityCode::new(*a, *b)),
        _ => Err(format!("expected `A,B` or two characters, got `{s}`")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Public { suri } => {
            let prover = Prover::from_uri(&suri)?;
            let public = prover.public().to_raw_vec();
            println!("0x{}", HexDisplay::from(&public));
        }
        Command::Prove {
            suri,
            agent_id,
            code,
            last_message,
            message_number,
            body,
            message_code,
        } => {
            let prover = Prover::from_uri(&suri)?;
            let record = AgentRecord { agent_id, last_message, security_code: code };
            let body = MessageBody::try_from(body.into_bytes())
                .map_err(|_| anyhow::anyhow!("message body exceeds the wire limit"))?;
            let message = Message {
                message_number,
                agent_id,
                body,
                security_code: message_code.unwrap_or(code),
            };

            let certificate = prover
                .prove(&record, &message)
                .with_context(|| format!("cannot certify message {message_number} for agent {agent_id}"))?;
            tracing::info!(agent_id, message_number, "certificate issued");
            println!("0x{}", HexDisplay::from(&certificate.encode()));
        }
    }

    Ok(())
}

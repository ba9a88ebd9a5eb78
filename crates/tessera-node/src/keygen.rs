//! keygen: generate a Dilithium2 keypair for a Tessera account.
//!
//! Prints the base-58 address and hex-encoded keys as JSON, or writes them to
//! `--out`. The address is what genesis params and RPC queries expect.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use tessera_crypto::KeyPair;

#[derive(Parser, Debug)]
#[command(name = "keygen", version, about = "Generate a Tessera account keypair")]
struct Args {
    /// Write the key file here instead of printing it.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct KeyFile {
    address: String,
    public_key: String,
    secret_key: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let kp = KeyPair::generate();
    let file = KeyFile {
        address: kp.address.to_b58(),
        public_key: hex::encode(&kp.public_key.0),
        secret_key: hex::encode(kp.secret_key_bytes()),
    };
    let json = serde_json::to_string_pretty(&file).context("encoding key file")?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("writing key file {}", path.display()))?;
            println!("{}", file.address);
        }
        None => println!("{json}"),
    }
    Ok(())
}

// Tanglekit
// Copyright (C) 2023-2024  Tanglekit contributors
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Command-line demo around the tanglekit primitives.
//!
//! Every sub-command is a thin printing wrapper over one library call. Errors are printed in
//! their canonical `Display` form and exit with status 1; Bech32 syntax errors additionally
//! get a caret line pointing at the offending byte.

use clap::Parser as _;
use rand::RngCore as _;
use tanglekit::bech32::address;
use tanglekit::bip39::wordlist::Language;
use tanglekit::{bip39, ed25519, pow, slip10};

mod cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli::CliOptions::parse() {
        cli::CliOptions::Encode(options) => run_encode(options),
        cli::CliOptions::Decode(options) => run_decode(options),
        cli::CliOptions::Mine(options) => run_mine(options),
        cli::CliOptions::Derive(options) => run_derive(options),
        cli::CliOptions::Mnemonic(options) => run_mnemonic(options),
    };

    if let Err(message) = result {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }
}

fn run_encode(options: cli::CliOptionsEncode) -> Result<(), String> {
    let prefix: address::Prefix =
        options.prefix.parse().map_err(|err| format!("invalid prefix: {}", err))?;
    let key = hex::decode(&options.key).map_err(|err| format!("invalid key: {}", err))?;

    let addr = match options.version.as_str() {
        "Ed25519" => {
            let key: [u8; ed25519::PUBLIC_KEY_SIZE] =
                key.try_into().map_err(|_| "invalid public key length".to_owned())?;
            address::from_public_key(&ed25519::PublicKey::from_bytes(key))
        }
        "Alias" | "NFT" => {
            let output_id: [u8; address::OUTPUT_ID_SIZE] =
                key.try_into().map_err(|_| "invalid output ID length".to_owned())?;
            if options.version == "Alias" {
                address::alias_from_output_id(&output_id)
            } else {
                address::nft_from_output_id(&output_id)
            }
        }
        other => return Err(format!("invalid address version: {}", other)),
    };

    let encoded = addr.to_bech32(prefix);
    println!("==> Bech32 Address Encoder");
    println!("  hash ({}-byte):\t{}", addr.hash().len(), addr);
    println!("  network ({}-char):\t{}", prefix.hrp().len(), prefix);
    println!("  version (1-byte):\t{:#04x} ({})", addr.version(), addr.kind());
    println!("  bech32 ({}-char):\t{}", encoded.len(), encoded);
    Ok(())
}

fn run_decode(options: cli::CliOptionsDecode) -> Result<(), String> {
    println!("==> Bech32 Address Decoder");
    println!("  bech32 ({}-char):\t{}", options.address.len(), options.address);

    let (prefix, addr) = address::parse_bech32(&options.address).map_err(|err| {
        if let address::ParseError::Bech32(syntax) = &err {
            if let Some(offset) = syntax.offset {
                // a caret under the offending byte; the two tabs line up with the output above
                eprintln!("\t\t\t{}^", " ".repeat(offset));
            }
        }
        err.to_string()
    })?;

    println!("  network ({}-char):\t{}", prefix.hrp().len(), prefix);
    println!("  version (1-byte):\t{:#04x} ({})", addr.version(), addr.kind());
    println!("  hash ({}-byte):\t{}", addr.hash().len(), addr);
    Ok(())
}

fn run_mine(options: cli::CliOptionsMine) -> Result<(), String> {
    let data = hex::decode(&options.data).map_err(|err| format!("invalid data: {}", err))?;
    let workers = if options.workers > 0 {
        options.workers
    } else {
        std::thread::available_parallelism().map(usize::from).unwrap_or(1)
    };

    tracing::info!(workers, zeros = options.target, "mining");
    let start = std::time::Instant::now();
    let nonce = pow::Miner::new(workers)
        .mine(&data, options.target, &pow::CancelHandle::new())
        .map_err(|err| err.to_string())?;
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "nonce found");

    let mut message = data;
    message.extend_from_slice(&nonce.to_le_bytes());
    println!("==> Proof of Work");
    println!("  nonce:\t{}", nonce);
    println!("  score:\t{:.4}", pow::score(&message));
    Ok(())
}

fn run_derive(options: cli::CliOptionsDerive) -> Result<(), String> {
    let curve = match options.curve.as_str() {
        "ed25519" => slip10::Curve::Ed25519,
        "secp256k1" => slip10::Curve::Secp256k1,
        "nist256p1" => slip10::Curve::Nist256p1,
        other => return Err(format!("unknown curve: {}", other)),
    };
    let path: tanglekit::bip32path::Path =
        options.path.parse().map_err(|err| format!("invalid path: {}", err))?;

    let seed = match (&options.mnemonic, &options.seed) {
        (Some(mnemonic), _) => {
            let mnemonic = bip39::Mnemonic::parse(mnemonic);
            let seed = bip39::mnemonic_to_seed(
                &mnemonic,
                &options.passphrase,
                Language::English.wordlist(),
            )
            .map_err(|err| format!("invalid mnemonic: {}", err))?;
            seed.to_vec()
        }
        (None, Some(seed)) => hex::decode(seed).map_err(|err| format!("invalid seed: {}", err))?,
        (None, None) => return Err("either --mnemonic or --seed is required".to_owned()),
    };

    let key = slip10::derive_key_from_path(&seed, curve, &path).map_err(|err| err.to_string())?;

    println!("==> SLIP-10 Key Derivation");
    println!("  curve:\t{}", curve.name());
    println!("  path:\t\t{}", path);
    println!("  chain code:\t{}", hex::encode(key.chain_code()));
    println!("  private key:\t{}", hex::encode(key.key_bytes()));
    println!("  public key:\t{}", hex::encode(key.public_key_bytes()));
    println!("  fingerprint:\t{}", hex::encode(key.fingerprint()));
    Ok(())
}

fn run_mnemonic(options: cli::CliOptionsMnemonic) -> Result<(), String> {
    let language: Language =
        options.language.parse().map_err(|err| format!("{}", err))?;
    let wordlist = language.wordlist();

    let entropy = match &options.entropy {
        Some(entropy) => hex::decode(entropy).map_err(|err| format!("invalid entropy: {}", err))?,
        None => {
            let mut entropy = vec![0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut entropy);
            entropy
        }
    };

    let mnemonic =
        bip39::entropy_to_mnemonic(&entropy, wordlist).map_err(|err| err.to_string())?;
    let seed = bip39::mnemonic_to_seed(&mnemonic, &options.passphrase, wordlist)
        .map_err(|err| err.to_string())?;

    println!("==> BIP-39 Mnemonic");
    println!("  entropy ({}-byte):\t{}", entropy.len(), hex::encode(&entropy));
    println!("  language:\t\t{}", language);
    println!("  mnemonic:\t\t{}", mnemonic);
    println!("  seed ({}-byte):\t{}", seed.len(), hex::encode(&seed[..]));
    Ok(())
}

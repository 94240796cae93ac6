//! Masternode broadcast signing CLI.
//!
//! # Usage
//!
//! ```bash
//! # Print the SIGN_MNB request for a broadcast
//! mnsign_cli build_apdu --path "m/44'/9797'/0'/0/0" --txid <hex> --vout 1 \
//!     --addr 10.0.0.1:39797 --collateral-pubkey <hex> --masternode-pubkey <hex>
//!
//! # Run the request through the in-process device (development seed)
//! mnsign_cli simulate --path "m/44'/9797'/0'/0/0" --txid <hex> --vout 1 \
//!     --addr 10.0.0.1:39797 --masternode-pubkey <hex>
//!
//! # List the entries of a masternode.conf
//! mnsign_cli conf masternode.conf
//! ```

use app::ui::format_ipv4;
use clap::{Args, Parser, Subcommand};

use common::constants::ENERGI_COIN_TYPE;
use common::KeyPath;
use mnsign_client::apdu::sign_mnb_apdu;
use mnsign_client::conf::read_conf;
use mnsign_client::masternode::{MasternodeBroadcast, OutPoint, Service};
use mnsign_client::{InProcessDevice, MnbClient, MnbClientError};

#[derive(Parser, Debug)]
#[command(name = "mnsign-cli", about = "Sign masternode broadcasts")]
struct Cli {
    #[clap(subcommand)]
    command: CliCommand,
}

/// Broadcast fields shared by the subcommands.
#[derive(Args, Debug)]
struct BroadcastArgs {
    /// Collateral key path; defaults to m/44'/9797'/0'/0/0
    #[clap(long)]
    path: Option<String>,
    /// Collateral transaction id (display order)
    #[clap(long)]
    txid: String,
    /// Collateral output index
    #[clap(long)]
    vout: u32,
    /// Masternode address, ip:port
    #[clap(long)]
    addr: String,
    /// Masternode public key (hex, uncompressed)
    #[clap(long)]
    masternode_pubkey: String,
    /// Signature time; defaults to now
    #[clap(long)]
    sig_time: Option<i64>,
}

#[derive(Subcommand, Debug)]
#[clap(rename_all = "snake_case")]
enum CliCommand {
    /// Print the SIGN_MNB request APDU
    BuildApdu {
        #[clap(flatten)]
        broadcast: BroadcastArgs,
        /// Collateral public key (hex, compressed)
        #[clap(long)]
        collateral_pubkey: String,
    },
    /// Sign through the in-process device and verify the result
    Simulate {
        #[clap(flatten)]
        broadcast: BroadcastArgs,
        /// Decline on the device
        #[clap(long)]
        reject: bool,
    },
    /// List the entries of a masternode.conf file
    Conf {
        file: String,
    },
}

fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| format!("Invalid hex: {}", e))
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn collateral_path(args: &BroadcastArgs) -> Result<KeyPath, MnbClientError> {
    let path = match &args.path {
        Some(path) => path.parse()?,
        None => KeyPath::bip44(ENERGI_COIN_TYPE, 0, 0, 0)?,
    };
    Ok(path)
}

fn build_broadcast(
    args: &BroadcastArgs,
    collateral_pubkey: Vec<u8>,
) -> Result<(KeyPath, MasternodeBroadcast), MnbClientError> {
    let path = collateral_path(args)?;
    let outpoint = OutPoint::from_txid_hex(&args.txid, args.vout)?;
    let addr: Service = args.addr.parse()?;
    let masternode_pubkey = parse_hex(&args.masternode_pubkey)?;

    let mnb = MasternodeBroadcast::new(
        outpoint,
        addr,
        collateral_pubkey,
        masternode_pubkey,
        args.sig_time.unwrap_or_else(now),
    );
    Ok((path, mnb))
}

fn handle_cli_command(cli: &Cli) -> Result<(), MnbClientError> {
    match &cli.command {
        CliCommand::BuildApdu {
            broadcast,
            collateral_pubkey,
        } => {
            let (path, mnb) = build_broadcast(broadcast, parse_hex(collateral_pubkey)?)?;
            let apdu = sign_mnb_apdu(&path, &mnb.serialize_for_hash())?;
            println!("{}", hex::encode(apdu));
        }
        CliCommand::Simulate { broadcast, reject } => {
            let device = InProcessDevice::with_dev_seed()?;
            device.platform().set_auto_approve(!reject);

            let path = collateral_path(broadcast)?;
            let collateral = device.keyring().public_key(&path)?;
            let (path, mnb) = build_broadcast(broadcast, collateral.to_vec())?;

            let mut client = MnbClient::new(device);
            let signature = client.sign_broadcast(&path, &mnb)?;
            println!("Collateral pubkey: {}", hex::encode(collateral));
            println!("Hash: {}", hex::encode(mnb.signature_hash()));
            println!("Signature: {}", hex::encode(signature.to_compact()));
            println!("Verified: true");
        }
        CliCommand::Conf { file } => {
            for entry in read_conf(file)? {
                println!(
                    "{} {}:{} {}:{}",
                    entry.alias,
                    entry
                        .service
                        .ipv4_addr()
                        .map(|ip| format_ipv4(&ip))
                        .unwrap_or_default(),
                    entry.service.port,
                    hex::encode(entry.outpoint.txid.iter().rev().copied().collect::<Vec<u8>>()),
                    entry.outpoint.vout
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "debug")]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
    }

    let cli = Cli::parse();
    if let Err(e) = handle_cli_command(&cli) {
        match e {
            MnbClientError::Device(sw) => println!("Device error: {}", sw),
            e => return Err(Box::new(e)),
        }
    }
    Ok(())
}

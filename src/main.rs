// Demo driver for the ledger: seed accounts, mint the supply, then run the
// miner loop over random transfers and print balances after every block.
use clap::Parser;
use log::{error, warn, LevelFilter};
use ox_ledger::{
    seed_accounts, Amount, Blockchain, ChainConfig, Command, InMemoryRepository, Opt, Repository,
    RoundOutcome, WalletId,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::PathBuf;
use std::process;

const MIN_TRANSFER_SIZE: u64 = 100;
const MAX_TRANSFER_SIZE: u64 = 5_000;

struct DemoOptions {
    users: usize,
    miners: usize,
    rounds: usize,
    transfers: usize,
    fee: Option<Amount>,
    config: Option<PathBuf>,
    json: bool,
}

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Demo {
            users,
            miners,
            rounds,
            transfers,
            fee,
            config,
            json,
        } => run_demo(DemoOptions {
            users,
            miners,
            rounds,
            transfers,
            fee,
            config,
            json,
        })?,
        Command::ShowConfig { config } => {
            let config = ChainConfig::load(config.as_deref())?;
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

fn run_demo(options: DemoOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = ChainConfig::load(options.config.as_deref())?;
    let mut repository = InMemoryRepository::new();
    let seeded = seed_accounts(&mut repository, options.users, options.miners)?;
    let wallets: Vec<WalletId> = seeded.users.iter().map(|w| w.get_id()).collect();

    let mut chain = Blockchain::new(repository, config)?;
    chain.initialise()?;
    chain.distribute_genesis_funds()?;
    print_balances(&chain)?;

    for round in 1..=options.rounds {
        submit_random_transfers(&chain, &wallets, options.transfers, options.fee);

        match chain.mine_next_block() {
            Ok(outcome) => {
                match &outcome {
                    RoundOutcome::Mined(mined) => println!(
                        "Round {round}: block {} added with {} transactions",
                        mined.position, mined.transaction_count
                    ),
                    RoundOutcome::Idle { .. } => {
                        println!("Round {round}: waiting for the transaction pool to populate...")
                    }
                }
                if !outcome.get_skipped().is_empty() {
                    println!("  {} oversized transactions left in the pool", outcome.get_skipped().len());
                }
            }
            Err(e) if e.is_retryable() => warn!("Round {round}: {e}; retrying next round"),
            Err(e) => return Err(e.into()),
        }
        print_balances(&chain)?;
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(chain.get_ledger().blocks())?);
    } else {
        print_chain(&chain);
    }
    Ok(())
}

fn submit_random_transfers(
    chain: &Blockchain<InMemoryRepository>,
    wallets: &[WalletId],
    count: usize,
    fee: Option<Amount>,
) {
    let mut rng = rand::thread_rng();
    for _ in 0..count {
        let pair: Vec<WalletId> = wallets.choose_multiple(&mut rng, 2).copied().collect();
        let &[source, destination] = pair.as_slice() else {
            return;
        };

        // spend at most a quarter of what the source can still cover
        let available = chain.balance_of(source).projected() - fee.unwrap_or(Amount::ZERO);
        let ceiling = available.units() / 4;
        if ceiling < 1 {
            continue;
        }
        let amount = Amount::from_units(rng.gen_range(1..=ceiling));
        let size = rng.gen_range(MIN_TRANSFER_SIZE..=MAX_TRANSFER_SIZE);

        if let Err(e) = chain.submit_transfer(source, destination, amount, fee, size) {
            warn!("Transfer from {source} rejected: {e}");
        }
    }
}

fn print_balances(chain: &Blockchain<InMemoryRepository>) -> Result<(), Box<dyn std::error::Error>> {
    let repository = chain.get_repository();

    println!("Balances...");
    println!("{:<30}  |  {:>20}  |  {:>20}", "Name", "Verified", "Unverified");
    for user in repository.users_all() {
        let wallet = repository.wallet_for_user(user.get_id())?;
        let balance = chain.balance_of(wallet.get_id());
        println!(
            "{:<30}  |  {:>20}  |  {:>20}",
            user.full_name(),
            balance.verified.to_string(),
            balance.unverified.to_string()
        );
    }

    println!("Miner balances:");
    for miner in repository.miners_all() {
        let balance = chain.balance_of(miner.get_wallet_id());
        println!("{}  |  {}", miner.get_id(), balance);
    }

    println!("Mining reward: {}", chain.mining_reward());
    println!("Supply remaining: {}", chain.supply_remaining()?);
    Ok(())
}

fn print_chain(chain: &Blockchain<InMemoryRepository>) {
    println!("Ledger valid hashes:");
    println!("Position  |  Size  |  Nonce  |  Hash");
    for block in chain.get_ledger().iter() {
        println!(
            "{}  |  {}  |  {}  |  {}",
            block.get_position(),
            block.get_size(),
            block.get_nonce(),
            block.get_hash()
        );
    }
}

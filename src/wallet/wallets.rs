use crate::error::{LedgerError, Result};
use crate::storage::InMemoryRepository;
use crate::wallet::{User, Wallet};
use log::info;
use rand::seq::SliceRandom;

const GIVEN_NAMES: [&str; 10] = [
    "Ada", "Alan", "Barbara", "Claude", "Donald", "Edsger", "Frances", "Grace", "John", "Margaret",
];

const FAMILY_NAMES: [&str; 10] = [
    "Lovelace", "Turing", "Liskov", "Shannon", "Knuth", "Dijkstra", "Allen", "Hopper", "Backus",
    "Hamilton",
];

/// Accounts registered by [`seed_accounts`]
pub struct SeededAccounts {
    pub genesis: Wallet,
    /// Spending wallets of the ordinary users, in registration order
    pub users: Vec<Wallet>,
}

/// Register the genesis account, `users` ordinary users and `miners` miner
/// wallets owned by randomly chosen users.
pub fn seed_accounts(
    repository: &mut InMemoryRepository,
    users: usize,
    miners: usize,
) -> Result<SeededAccounts> {
    if miners > 0 && users == 0 {
        return Err(LedgerError::Config(
            "Miners need at least one user to own their wallets".to_string(),
        ));
    }

    let genesis = repository.add_user(User::genesis());
    let mut wallets = Vec::with_capacity(users);
    for i in 0..users {
        let given = GIVEN_NAMES[i % GIVEN_NAMES.len()];
        let family = FAMILY_NAMES[(i / GIVEN_NAMES.len() + i) % FAMILY_NAMES.len()];
        wallets.push(repository.add_user(User::new(given, family)));
    }

    let mut rng = rand::thread_rng();
    for _ in 0..miners {
        if let Some(owner) = wallets.choose(&mut rng) {
            repository.add_miner(owner.get_user_id())?;
        }
    }

    info!("Seeded {users} users and {miners} miners");
    Ok(SeededAccounts {
        genesis,
        users: wallets,
    })
}

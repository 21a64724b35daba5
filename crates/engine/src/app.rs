//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::gateway::ProviderGateway;
use crate::infrastructure::ports::{GameRepo, ItemRepo, PartyRepo, TurnRepo};
use crate::use_cases;
use crate::use_cases::inventory::UseItem;
use crate::use_cases::narration::{ApplyStateUpdates, HandlePlayerAction};

/// Main application state.
///
/// Holds the repository ports and use cases. Passed to HTTP handlers via
/// Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Container for the repository ports.
pub struct Repositories {
    pub games: Arc<dyn GameRepo>,
    pub party: Arc<dyn PartyRepo>,
    pub turns: Arc<dyn TurnRepo>,
    pub items: Arc<dyn ItemRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub narration: use_cases::NarrationUseCases,
    pub inventory: use_cases::InventoryUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        games: Arc<dyn GameRepo>,
        party: Arc<dyn PartyRepo>,
        turns: Arc<dyn TurnRepo>,
        items: Arc<dyn ItemRepo>,
        gateway: Arc<ProviderGateway>,
    ) -> Self {
        let apply = ApplyStateUpdates::new(party.clone(), items.clone());
        let handle_player_action = Arc::new(HandlePlayerAction::new(
            games.clone(),
            party.clone(),
            turns.clone(),
            gateway,
            apply,
        ));
        let use_item = Arc::new(UseItem::new(party.clone(), items.clone()));

        Self {
            repositories: Repositories {
                games,
                party,
                turns,
                items,
            },
            use_cases: UseCases {
                narration: use_cases::NarrationUseCases {
                    handle_player_action,
                },
                inventory: use_cases::InventoryUseCases { use_item },
            },
        }
    }
}

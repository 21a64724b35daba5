//! State mutation engine.
//!
//! Applies a validated update-set to the party roster and performs the
//! underlying persistence writes. Each character's full HP/MP/XP/level/
//! status mutation is one atomic `apply_stat_write`; one character
//! failing never blocks another.

use std::collections::HashMap;
use std::sync::Arc;

use lorekeeper_domain::{
    level_for_xp, ItemName, PartyMember, LEVEL_UP_HP_BONUS, LEVEL_UP_MP_BONUS,
    PLACEHOLDER_DESCRIPTION,
};

use crate::infrastructure::ports::{ItemRepo, PartyRepo, StatWrite};

use super::payload::{CharacterUpdate, ControlPayload, LootGrant, StatusAction};

/// State mutation engine.
///
/// Orchestrates: roster lookup, stat arithmetic, level-up computation,
/// status-effect set edits, loot resolution, inventory upserts.
pub struct ApplyStateUpdates {
    party_repo: Arc<dyn PartyRepo>,
    item_repo: Arc<dyn ItemRepo>,
}

impl ApplyStateUpdates {
    pub fn new(party_repo: Arc<dyn PartyRepo>, item_repo: Arc<dyn ItemRepo>) -> Self {
        Self {
            party_repo,
            item_repo,
        }
    }

    /// Apply a validated update-set against the current roster.
    ///
    /// Returns the human-readable annotations (level-up banners, loot
    /// notices) to append to the narrative, in the order they were
    /// produced. Directives naming unknown characters are skipped - the
    /// narrator may hallucinate names - and a persistence failure for one
    /// character does not stop the rest.
    pub async fn execute(&self, roster: &[PartyMember], payload: &ControlPayload) -> Vec<String> {
        let mut annotations = Vec::new();

        // Working copies keyed by display name. Directives within one
        // update-set see the effects of earlier directives (two XP gains
        // for the same character must not double-grant level bonuses).
        let mut working: HashMap<String, PartyMember> = roster
            .iter()
            .map(|m| (m.name().as_str().to_string(), m.clone()))
            .collect();

        for update in &payload.updates {
            let Some(member) = working.get_mut(&update.character_name) else {
                tracing::warn!(
                    character = %update.character_name,
                    "Update names a character not in the roster, skipping"
                );
                continue;
            };

            let (write, level_up) = plan_stat_write(member, update);
            if write.is_empty() {
                continue;
            }

            match self.party_repo.apply_stat_write(member.id(), write.clone()).await {
                Ok(()) => {
                    apply_to_working_copy(member, &write);
                    if let Some(annotation) = level_up {
                        annotations.push(annotation);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        character = %update.character_name,
                        error = %e,
                        "Failed to persist stat write, continuing with remaining updates"
                    );
                }
            }
        }

        for grant in &payload.loot {
            match self.resolve_loot(&working, grant).await {
                Ok(Some(annotation)) => annotations.push(annotation),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        character = %grant.character_name,
                        item = %grant.item_name,
                        error = %e,
                        "Failed to resolve loot grant, continuing with remaining entries"
                    );
                }
            }
        }

        annotations
    }

    /// Resolve one loot grant: find or create the item, upsert the stack.
    async fn resolve_loot(
        &self,
        working: &HashMap<String, PartyMember>,
        grant: &LootGrant,
    ) -> Result<Option<String>, crate::infrastructure::ports::RepoError> {
        let Some(member) = working.get(&grant.character_name) else {
            tracing::warn!(
                character = %grant.character_name,
                "Loot grant names a character not in the roster, skipping"
            );
            return Ok(None);
        };

        let Ok(name) = ItemName::new(grant.item_name.clone()) else {
            tracing::warn!(item = %grant.item_name, "Invalid item name in loot grant, skipping");
            return Ok(None);
        };

        let item = match self.item_repo.get_by_name(&name).await? {
            Some(item) => item,
            None => {
                let description = grant
                    .description
                    .clone()
                    .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string());
                let item = lorekeeper_domain::Item::new(name).with_description(description);
                self.item_repo.save(&item).await?;
                item
            }
        };

        let quantity = u32::try_from(grant.quantity).unwrap_or(u32::MAX);
        self.item_repo
            .upsert_inventory(member.id(), item.id(), quantity)
            .await?;

        Ok(Some(format!(
            "📦 {} received {}x {}.",
            member.name(),
            quantity,
            item.name()
        )))
    }
}

/// Compute one character's atomic stat write from a directive.
///
/// HP/MP deltas are taken as-is, XP accumulates, the level is recomputed
/// from the new total, and level-up bonuses are folded into the deltas.
/// Deltas come from the narrator's payload, so all arithmetic saturates.
/// The store clamps current to max inside the write itself; clamping here
/// from the roster snapshot would race with concurrent turns. No floor at
/// zero: death handling is a narrative concern.
fn plan_stat_write(member: &PartyMember, update: &CharacterUpdate) -> (StatWrite, Option<String>) {
    let mut write = StatWrite {
        hp_delta: update.hp_change.unwrap_or(0),
        mp_delta: update.mp_change.unwrap_or(0),
        xp_delta: update.xp_change.unwrap_or(0),
        ..Default::default()
    };
    let mut level_up = None;

    let new_total = member.xp().saturating_add(write.xp_delta);
    let new_level = level_for_xp(new_total);
    let levels_gained = new_level.saturating_sub(member.level());
    if levels_gained > 0 {
        let hp_bonus = LEVEL_UP_HP_BONUS.saturating_mul(i64::from(levels_gained));
        let mp_bonus = LEVEL_UP_MP_BONUS.saturating_mul(i64::from(levels_gained));
        write.hp_delta = write.hp_delta.saturating_add(hp_bonus);
        write.max_hp_delta = write.max_hp_delta.saturating_add(hp_bonus);
        write.mp_delta = write.mp_delta.saturating_add(mp_bonus);
        write.max_mp_delta = write.max_mp_delta.saturating_add(mp_bonus);
        write.set_level = Some(new_level);
        level_up = Some(format!(
            "🎉 {} reached level {}! (+{} HP, +{} MP)",
            member.name(),
            new_level,
            hp_bonus,
            mp_bonus
        ));
    }

    if let (Some(label), Some(action)) = (&update.status_effect, update.action) {
        let mut effects = member.status_effects().clone();
        let changed = match action {
            StatusAction::Add => effects.add(label),
            StatusAction::Remove => effects.remove(label),
        };
        if changed {
            write.set_status_effects = Some(effects);
        }
    }

    (write, level_up)
}

/// Mirror a persisted write onto the in-pass working copy, including the
/// clamp the store performs.
fn apply_to_working_copy(member: &mut PartyMember, write: &StatWrite) {
    member.adjust_hp(write.hp_delta, write.max_hp_delta);
    member.adjust_mp(write.mp_delta, write.max_mp_delta);
    member.add_xp(write.xp_delta);
    if let Some(level) = write.set_level {
        member.raise_level(level);
    }
    if let Some(effects) = &write.set_status_effects {
        member.set_status_effects(effects.clone());
    }
    member.clamp_to_maxima();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockItemRepo, MockPartyRepo, RepoError};
    use lorekeeper_domain::{CharacterId, CharacterName, GameId, Item, StatusEffects};

    fn sorian() -> PartyMember {
        PartyMember::new(
            GameId::new(),
            CharacterId::new(),
            CharacterName::new("Sorian").expect("valid name"),
            "Cleric",
        )
        .with_hp(20, 20)
        .with_mp(10, 10)
        .with_xp(90)
    }

    fn update(name: &str) -> CharacterUpdate {
        CharacterUpdate {
            character_name: name.to_string(),
            hp_change: None,
            mp_change: None,
            xp_change: None,
            status_effect: None,
            action: None,
        }
    }

    fn payload_of(updates: Vec<CharacterUpdate>, loot: Vec<LootGrant>) -> ControlPayload {
        ControlPayload { updates, loot }
    }

    #[tokio::test]
    async fn damage_plus_xp_triggers_level_up_bonuses() {
        let member = sorian();
        let member_id = member.id();

        let mut party_repo = MockPartyRepo::new();
        party_repo
            .expect_apply_stat_write()
            .withf(move |id, write| {
                *id == member_id
                    && *write
                        == StatWrite {
                            // -5 damage +10 level bonus
                            hp_delta: 5,
                            max_hp_delta: 10,
                            mp_delta: 5,
                            max_mp_delta: 5,
                            xp_delta: 15,
                            set_level: Some(2),
                            set_status_effects: None,
                        }
            })
            .returning(|_, _| Ok(()));
        let item_repo = MockItemRepo::new();

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        let annotations = engine
            .execute(
                &[member],
                &payload_of(
                    vec![CharacterUpdate {
                        hp_change: Some(-5),
                        xp_change: Some(15),
                        ..update("Sorian")
                    }],
                    vec![],
                ),
            )
            .await;

        assert_eq!(annotations.len(), 1);
        assert!(annotations[0].contains("Sorian reached level 2"));
        assert!(annotations[0].contains("+10 HP, +5 MP"));
    }

    #[tokio::test]
    async fn overheal_delta_is_passed_through_for_the_store_to_clamp() {
        let member = sorian().with_hp(18, 20).with_xp(0);
        let member_id = member.id();

        let mut party_repo = MockPartyRepo::new();
        party_repo
            .expect_apply_stat_write()
            .withf(move |id, write| {
                // The full +10 goes to the store; pre-clamping from this
                // roster snapshot could race with another turn's write.
                *id == member_id && write.hp_delta == 10 && write.set_level.is_none()
            })
            .returning(|_, _| Ok(()));
        let item_repo = MockItemRepo::new();

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        engine
            .execute(
                &[member],
                &payload_of(
                    vec![CharacterUpdate {
                        hp_change: Some(10),
                        ..update("Sorian")
                    }],
                    vec![],
                ),
            )
            .await;
    }

    #[tokio::test]
    async fn extreme_deltas_saturate_instead_of_overflowing() {
        let member = sorian();
        let member_id = member.id();

        let mut party_repo = MockPartyRepo::new();
        party_repo
            .expect_apply_stat_write()
            .withf(move |id, write| {
                *id == member_id && write.xp_delta == i64::MAX && write.set_level.is_some()
            })
            .returning(|_, _| Ok(()));
        let item_repo = MockItemRepo::new();

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        let annotations = engine
            .execute(
                &[member],
                &payload_of(
                    vec![CharacterUpdate {
                        xp_change: Some(i64::MAX),
                        ..update("Sorian")
                    }],
                    vec![],
                ),
            )
            .await;
        assert_eq!(annotations.len(), 1);
    }

    #[tokio::test]
    async fn negative_xp_never_lowers_the_level() {
        let member = sorian().with_xp(400); // level 3
        let member_id = member.id();

        let mut party_repo = MockPartyRepo::new();
        party_repo
            .expect_apply_stat_write()
            .withf(move |id, write| {
                *id == member_id && write.xp_delta == -300 && write.set_level.is_none()
            })
            .returning(|_, _| Ok(()));
        let item_repo = MockItemRepo::new();

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        let annotations = engine
            .execute(
                &[member],
                &payload_of(
                    vec![CharacterUpdate {
                        xp_change: Some(-300),
                        ..update("Sorian")
                    }],
                    vec![],
                ),
            )
            .await;
        assert!(annotations.is_empty());
    }

    #[tokio::test]
    async fn unknown_character_is_silently_skipped() {
        let party_repo = MockPartyRepo::new();
        let item_repo = MockItemRepo::new();

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        let annotations = engine
            .execute(
                &[sorian()],
                &payload_of(
                    vec![CharacterUpdate {
                        hp_change: Some(-5),
                        ..update("Zorblax")
                    }],
                    vec![],
                ),
            )
            .await;
        assert!(annotations.is_empty());
    }

    #[tokio::test]
    async fn adding_a_present_status_effect_is_a_no_op() {
        let member = sorian()
            .with_status_effects(StatusEffects::from_labels(vec!["Poisoned".to_string()]));
        // No repo expectations: a no-op directive produces no write at all
        let party_repo = MockPartyRepo::new();
        let item_repo = MockItemRepo::new();

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        let annotations = engine
            .execute(
                &[member],
                &payload_of(
                    vec![CharacterUpdate {
                        status_effect: Some("Poisoned".to_string()),
                        action: Some(StatusAction::Add),
                        ..update("Sorian")
                    }],
                    vec![],
                ),
            )
            .await;
        assert!(annotations.is_empty());
    }

    #[tokio::test]
    async fn removing_a_present_status_effect_replaces_the_set() {
        let member = sorian()
            .with_status_effects(StatusEffects::from_labels(vec!["Poisoned".to_string()]));
        let member_id = member.id();

        let mut party_repo = MockPartyRepo::new();
        party_repo
            .expect_apply_stat_write()
            .withf(move |id, write| {
                *id == member_id
                    && write
                        .set_status_effects
                        .as_ref()
                        .is_some_and(|e| e.is_empty())
            })
            .returning(|_, _| Ok(()));
        let item_repo = MockItemRepo::new();

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        engine
            .execute(
                &[member],
                &payload_of(
                    vec![CharacterUpdate {
                        status_effect: Some("Poisoned".to_string()),
                        action: Some(StatusAction::Remove),
                        ..update("Sorian")
                    }],
                    vec![],
                ),
            )
            .await;
    }

    #[tokio::test]
    async fn one_character_failing_does_not_block_another() {
        let sorian = sorian();
        let brennal = PartyMember::new(
            sorian.game_id(),
            CharacterId::new(),
            CharacterName::new("Brennal").expect("valid name"),
            "Fighter",
        )
        .with_hp(25, 25);
        let brennal_id = brennal.id();
        let sorian_id = sorian.id();

        let mut party_repo = MockPartyRepo::new();
        party_repo
            .expect_apply_stat_write()
            .withf(move |id, _| *id == sorian_id)
            .returning(|_, _| Err(RepoError::storage("apply_stat_write", "store offline")));
        party_repo
            .expect_apply_stat_write()
            .withf(move |id, write| *id == brennal_id && write.hp_delta == -3)
            .returning(|_, _| Ok(()));
        let item_repo = MockItemRepo::new();

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        engine
            .execute(
                &[sorian, brennal],
                &payload_of(
                    vec![
                        CharacterUpdate {
                            hp_change: Some(-2),
                            ..update("Sorian")
                        },
                        CharacterUpdate {
                            hp_change: Some(-3),
                            ..update("Brennal")
                        },
                    ],
                    vec![],
                ),
            )
            .await;
    }

    #[tokio::test]
    async fn repeated_xp_directives_do_not_double_grant_bonuses() {
        // Two +60 XP directives: the second sees the first's total (150),
        // so only the first crosses the level-2 threshold.
        let member = sorian().with_xp(90);
        let member_id = member.id();

        let mut party_repo = MockPartyRepo::new();
        party_repo
            .expect_apply_stat_write()
            .withf(move |id, write| {
                *id == member_id && write.xp_delta == 60 && write.set_level == Some(2)
            })
            .times(1)
            .returning(|_, _| Ok(()));
        party_repo
            .expect_apply_stat_write()
            .withf(move |id, write| {
                *id == member_id && write.xp_delta == 60 && write.set_level.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let item_repo = MockItemRepo::new();

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        let annotations = engine
            .execute(
                &[member],
                &payload_of(
                    vec![
                        CharacterUpdate {
                            xp_change: Some(60),
                            ..update("Sorian")
                        },
                        CharacterUpdate {
                            xp_change: Some(60),
                            ..update("Sorian")
                        },
                    ],
                    vec![],
                ),
            )
            .await;
        assert_eq!(annotations.len(), 1);
    }

    #[tokio::test]
    async fn loot_creates_missing_item_and_upserts_inventory() {
        let member = sorian();
        let member_id = member.id();

        let party_repo = MockPartyRepo::new();
        let mut item_repo = MockItemRepo::new();
        item_repo
            .expect_get_by_name()
            .withf(|name| name.as_str() == "Healing Potion")
            .returning(|_| Ok(None));
        item_repo
            .expect_save()
            .withf(|item| {
                item.name().as_str() == "Healing Potion"
                    && item.description() == "Restores vitality."
            })
            .returning(|_| Ok(()));
        item_repo
            .expect_upsert_inventory()
            .withf(move |id, _, qty| *id == member_id && *qty == 2)
            .returning(|member_id, item_id, qty| {
                Ok(lorekeeper_domain::InventoryEntry::new(member_id, item_id, qty)
                    .expect("positive quantity"))
            });

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        let annotations = engine
            .execute(
                &[member],
                &payload_of(
                    vec![],
                    vec![LootGrant {
                        character_name: "Sorian".to_string(),
                        item_name: "Healing Potion".to_string(),
                        quantity: 2,
                        description: Some("Restores vitality.".to_string()),
                    }],
                ),
            )
            .await;

        assert_eq!(annotations, ["📦 Sorian received 2x Healing Potion."]);
    }

    #[tokio::test]
    async fn loot_reuses_existing_item_definition() {
        let member = sorian();

        let party_repo = MockPartyRepo::new();
        let existing =
            Item::new(ItemName::new("Healing Potion").expect("valid name"));
        let mut item_repo = MockItemRepo::new();
        let returned = existing.clone();
        item_repo
            .expect_get_by_name()
            .returning(move |_| Ok(Some(returned.clone())));
        // No expect_save: an existing definition is reused, not recreated
        item_repo
            .expect_upsert_inventory()
            .returning(|member_id, item_id, qty| {
                Ok(lorekeeper_domain::InventoryEntry::new(member_id, item_id, qty)
                    .expect("positive quantity"))
            });

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        let annotations = engine
            .execute(
                &[member],
                &payload_of(
                    vec![],
                    vec![LootGrant {
                        character_name: "Sorian".to_string(),
                        item_name: "Healing Potion".to_string(),
                        quantity: 1,
                        description: None,
                    }],
                ),
            )
            .await;
        assert_eq!(annotations.len(), 1);
    }

    #[tokio::test]
    async fn loot_for_unknown_character_is_skipped() {
        let party_repo = MockPartyRepo::new();
        let item_repo = MockItemRepo::new();

        let engine = ApplyStateUpdates::new(Arc::new(party_repo), Arc::new(item_repo));
        let annotations = engine
            .execute(
                &[sorian()],
                &payload_of(
                    vec![],
                    vec![LootGrant {
                        character_name: "Zorblax".to_string(),
                        item_name: "Cursed Ring".to_string(),
                        quantity: 1,
                        description: None,
                    }],
                ),
            )
            .await;
        assert!(annotations.is_empty());
    }
}

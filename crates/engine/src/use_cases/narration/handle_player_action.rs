//! The narration pipeline orchestrator.
//!
//! One player action in, one persisted narrator turn out: persist the
//! action, assemble the prompt from bounded history, generate, extract and
//! validate the control payload, mutate party state, compose the visible
//! response. Generation failure after retries is not an error here - the
//! pipeline degrades to a fixed unavailability notice so the story log
//! stays contiguous.

use std::collections::HashMap;
use std::sync::Arc;

use lorekeeper_domain::{CharacterId, GameId, Turn, TurnRole};

use crate::infrastructure::gateway::ProviderGateway;
use crate::infrastructure::ports::{
    ChatMessage, GameRepo, LlmRequest, NewTurn, PartyRepo, TurnRepo,
};

use super::apply::ApplyStateUpdates;
use super::compose::{compose_visible, REJECTED_ANNOTATION, UNAVAILABILITY_NOTICE};
use super::error::NarrationError;
use super::extract::extract;
use super::payload::{evaluate, PayloadOutcome};
use super::prompt::{self, AttributedTurn, NARRATOR_SPEAKER, UNATTRIBUTED_PLAYER};

/// How many prior turns feed the prompt.
const HISTORY_LIMIT: usize = 20;

/// Generation budget for one narrative turn.
const MAX_NARRATION_TOKENS: u32 = 1024;

/// The handled action's result.
#[derive(Debug, Clone)]
pub enum NarrationOutcome {
    /// A narrator turn was generated and persisted.
    Narrated { turn: Turn },
    /// Generation failed after retries; the persisted turn carries the
    /// fixed unavailability notice.
    Unavailable { turn: Turn },
}

impl NarrationOutcome {
    pub fn turn(&self) -> &Turn {
        match self {
            Self::Narrated { turn } | Self::Unavailable { turn } => turn,
        }
    }
}

pub struct HandlePlayerAction {
    game_repo: Arc<dyn GameRepo>,
    party_repo: Arc<dyn PartyRepo>,
    turn_repo: Arc<dyn TurnRepo>,
    gateway: Arc<ProviderGateway>,
    apply: ApplyStateUpdates,
}

impl HandlePlayerAction {
    pub fn new(
        game_repo: Arc<dyn GameRepo>,
        party_repo: Arc<dyn PartyRepo>,
        turn_repo: Arc<dyn TurnRepo>,
        gateway: Arc<ProviderGateway>,
        apply: ApplyStateUpdates,
    ) -> Self {
        Self {
            game_repo,
            party_repo,
            turn_repo,
            gateway,
            apply,
        }
    }

    /// Handle one player action end to end.
    ///
    /// The history window is read before the action is appended, so the
    /// new action appears in the prompt exactly once.
    pub async fn execute(
        &self,
        game_id: GameId,
        character_id: Option<CharacterId>,
        message: &str,
    ) -> Result<NarrationOutcome, NarrationError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(NarrationError::EmptyMessage);
        }

        let game = self
            .game_repo
            .get(game_id)
            .await?
            .ok_or(NarrationError::GameNotFound(game_id))?;
        let roster = self.party_repo.roster(game_id).await?;

        let history = self.turn_repo.recent(game_id, HISTORY_LIMIT).await?;
        self.turn_repo
            .append(NewTurn {
                game_id,
                role: TurnRole::Player,
                content: message.to_string(),
                character_id,
            })
            .await?;

        let names: HashMap<CharacterId, String> = roster
            .iter()
            .map(|m| (m.character_id(), m.name().to_string()))
            .collect();
        let actor_name = character_id
            .and_then(|id| names.get(&id).cloned())
            .unwrap_or_else(|| UNATTRIBUTED_PLAYER.to_string());
        let attributed: Vec<AttributedTurn> = history
            .iter()
            .map(|turn| AttributedTurn {
                speaker: speaker_for(turn, &names),
                content: turn.content().to_string(),
            })
            .collect();

        let assembled = prompt::assemble(&game, &roster, &attributed, &actor_name, message);
        let request = LlmRequest::new(vec![ChatMessage::user(assembled.user_prompt)])
            .with_system_prompt(assembled.system_instructions)
            .with_max_tokens(Some(MAX_NARRATION_TOKENS));

        let response = match self.gateway.generate(game.provider(), request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    game_id = %game_id,
                    provider = %game.provider(),
                    error = %e,
                    "Generation failed after retries, falling back to unavailability notice"
                );
                let turn = self
                    .turn_repo
                    .append(NewTurn {
                        game_id,
                        role: TurnRole::Narrator,
                        content: UNAVAILABILITY_NOTICE.to_string(),
                        character_id: None,
                    })
                    .await?;
                return Ok(NarrationOutcome::Unavailable { turn });
            }
        };

        let extracted = extract(&response.content);
        let annotations = match evaluate(extracted.as_ref()) {
            PayloadOutcome::Valid(payload) => self.apply.execute(&roster, &payload).await,
            PayloadOutcome::NoPayload => Vec::new(),
            PayloadOutcome::Rejected(reason) => {
                tracing::warn!(game_id = %game_id, reason = %reason, "Rejected control payload");
                vec![REJECTED_ANNOTATION.to_string()]
            }
        };

        let visible = compose_visible(&response.content, extracted.as_ref(), &annotations);
        let turn = self
            .turn_repo
            .append(NewTurn {
                game_id,
                role: TurnRole::Narrator,
                content: visible,
                character_id: None,
            })
            .await?;

        Ok(NarrationOutcome::Narrated { turn })
    }
}

fn speaker_for(turn: &Turn, names: &HashMap<CharacterId, String>) -> String {
    match turn.role() {
        TurnRole::Narrator | TurnRole::System => NARRATOR_SPEAKER.to_string(),
        TurnRole::Player => turn
            .character_id()
            .and_then(|id| names.get(&id).cloned())
            .unwrap_or_else(|| UNATTRIBUTED_PLAYER.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        LlmError, LlmPort, LlmResponse, MockGameRepo, MockItemRepo, MockPartyRepo, MockTurnRepo,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use lorekeeper_domain::{
        CharacterName, Game, PartyMember, ProviderKind,
    };
    use mockall::Sequence;

    struct ScriptedLlm(String);

    #[async_trait]
    impl LlmPort for ScriptedLlm {
        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
            Ok(LlmResponse {
                content: self.0.clone(),
            })
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmPort for FailingLlm {
        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
            Err(LlmError::RequestFailed("connection refused".to_string()))
        }
    }

    fn gateway_with(client: Arc<dyn LlmPort>) -> Arc<ProviderGateway> {
        let mut clients: HashMap<ProviderKind, Arc<dyn LlmPort>> = HashMap::new();
        clients.insert(ProviderKind::Ollama, client);
        Arc::new(ProviderGateway::with_clients(clients))
    }

    fn test_game(id: GameId) -> Game {
        Game::new("The Sunken Vale", ProviderKind::Ollama).with_id(id)
    }

    fn test_member(game_id: GameId, name: &str) -> PartyMember {
        PartyMember::new(
            game_id,
            CharacterId::new(),
            CharacterName::new(name).expect("valid name"),
            "Cleric",
        )
        .with_hp(20, 20)
        .with_mp(10, 10)
        .with_xp(90)
    }

    fn stub_turn_repo() -> MockTurnRepo {
        let mut turn_repo = MockTurnRepo::new();
        turn_repo.expect_recent().returning(|_, _| Ok(vec![]));
        turn_repo.expect_append().returning(|turn| {
            Ok(Turn::new(turn.game_id, turn.role, turn.content, Utc::now())
                .with_character(turn.character_id))
        });
        turn_repo
    }

    fn use_case(
        game_repo: MockGameRepo,
        party_repo: MockPartyRepo,
        turn_repo: MockTurnRepo,
        item_repo: MockItemRepo,
        gateway: Arc<ProviderGateway>,
    ) -> HandlePlayerAction {
        let party_repo = Arc::new(party_repo);
        HandlePlayerAction::new(
            Arc::new(game_repo),
            party_repo.clone(),
            Arc::new(turn_repo),
            gateway,
            ApplyStateUpdates::new(party_repo, Arc::new(item_repo)),
        )
    }

    #[tokio::test]
    async fn full_pipeline_mutates_state_and_strips_payload() {
        let game_id = GameId::new();
        let member = test_member(game_id, "Sorian");
        let character_id = member.character_id();
        let member_for_roster = member.clone();

        let mut game_repo = MockGameRepo::new();
        game_repo
            .expect_get()
            .returning(move |id| Ok(Some(test_game(id))));
        let mut party_repo = MockPartyRepo::new();
        party_repo
            .expect_roster()
            .returning(move |_| Ok(vec![member_for_roster.clone()]));
        party_repo
            .expect_apply_stat_write()
            .withf(|_, write| {
                write.xp_delta == 15 && write.hp_delta == 5 && write.set_level == Some(2)
            })
            .returning(|_, _| Ok(()));

        let response = "The ghoul's claws rake across your shoulder, but the \
            blow teaches you something about footwork.\n```json\n{\"updates\":[{\"characterName\":\"Sorian\",\"hpChange\":-5,\"xpChange\":15}]}\n```";
        let engine = use_case(
            game_repo,
            party_repo,
            stub_turn_repo(),
            MockItemRepo::new(),
            gateway_with(Arc::new(ScriptedLlm(response.to_string()))),
        );

        let outcome = engine
            .execute(game_id, Some(character_id), "I duck under the claws.")
            .await
            .expect("pipeline succeeds");

        let NarrationOutcome::Narrated { turn } = outcome else {
            panic!("expected a narrated outcome");
        };
        assert!(turn.content().contains("rake across your shoulder"));
        assert!(!turn.content().contains("```"));
        assert!(!turn.content().contains("hpChange"));
        assert!(turn.content().contains("Sorian reached level 2"));
    }

    #[tokio::test]
    async fn generation_failure_persists_the_unavailability_notice() {
        let game_id = GameId::new();
        let mut game_repo = MockGameRepo::new();
        game_repo
            .expect_get()
            .returning(move |id| Ok(Some(test_game(id))));
        let mut party_repo = MockPartyRepo::new();
        party_repo.expect_roster().returning(|_| Ok(vec![]));
        // No expect_apply_stat_write: mutation is skipped entirely

        let engine = use_case(
            game_repo,
            party_repo,
            stub_turn_repo(),
            MockItemRepo::new(),
            gateway_with(Arc::new(FailingLlm)),
        );

        let outcome = engine
            .execute(game_id, None, "I listen at the door.")
            .await
            .expect("fallback still succeeds");

        let NarrationOutcome::Unavailable { turn } = outcome else {
            panic!("expected the unavailable outcome");
        };
        assert_eq!(turn.content(), UNAVAILABILITY_NOTICE);
        assert_eq!(turn.role(), TurnRole::Narrator);
    }

    #[tokio::test]
    async fn blank_message_is_rejected_before_any_lookup() {
        let engine = use_case(
            MockGameRepo::new(),
            MockPartyRepo::new(),
            MockTurnRepo::new(),
            MockItemRepo::new(),
            gateway_with(Arc::new(FailingLlm)),
        );
        let result = engine.execute(GameId::new(), None, "   ").await;
        assert!(matches!(result, Err(NarrationError::EmptyMessage)));
    }

    #[tokio::test]
    async fn unknown_game_is_an_error() {
        let mut game_repo = MockGameRepo::new();
        game_repo.expect_get().returning(|_| Ok(None));

        let engine = use_case(
            game_repo,
            MockPartyRepo::new(),
            MockTurnRepo::new(),
            MockItemRepo::new(),
            gateway_with(Arc::new(FailingLlm)),
        );
        let result = engine.execute(GameId::new(), None, "I look around.").await;
        assert!(matches!(result, Err(NarrationError::GameNotFound(_))));
    }

    #[tokio::test]
    async fn rejected_payload_appends_the_annotation_and_writes_nothing() {
        let game_id = GameId::new();
        let mut game_repo = MockGameRepo::new();
        game_repo
            .expect_get()
            .returning(move |id| Ok(Some(test_game(id))));
        let mut party_repo = MockPartyRepo::new();
        let member = test_member(game_id, "Sorian");
        party_repo
            .expect_roster()
            .returning(move |_| Ok(vec![member.clone()]));
        // No expect_apply_stat_write: a rejected payload applies nothing

        let response = "The chest creaks open. { \"updates\": [";
        let engine = use_case(
            game_repo,
            party_repo,
            stub_turn_repo(),
            MockItemRepo::new(),
            gateway_with(Arc::new(ScriptedLlm(response.to_string()))),
        );

        let outcome = engine
            .execute(game_id, None, "I open the chest.")
            .await
            .expect("pipeline succeeds");
        assert!(outcome.turn().content().contains(REJECTED_ANNOTATION));
        assert!(outcome.turn().content().contains("The chest creaks open."));
    }

    #[tokio::test]
    async fn history_is_read_before_the_action_is_appended() {
        let game_id = GameId::new();
        let mut game_repo = MockGameRepo::new();
        game_repo
            .expect_get()
            .returning(move |id| Ok(Some(test_game(id))));
        let mut party_repo = MockPartyRepo::new();
        party_repo.expect_roster().returning(|_| Ok(vec![]));

        let mut seq = Sequence::new();
        let mut turn_repo = MockTurnRepo::new();
        turn_repo
            .expect_recent()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![]));
        turn_repo
            .expect_append()
            .withf(|turn| turn.role == TurnRole::Player)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|turn| {
                Ok(Turn::new(turn.game_id, turn.role, turn.content, Utc::now()))
            });
        turn_repo
            .expect_append()
            .withf(|turn| turn.role == TurnRole::Narrator)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|turn| {
                Ok(Turn::new(turn.game_id, turn.role, turn.content, Utc::now()))
            });

        let engine = use_case(
            game_repo,
            party_repo,
            turn_repo,
            MockItemRepo::new(),
            gateway_with(Arc::new(ScriptedLlm("A quiet night passes.".to_string()))),
        );
        engine
            .execute(game_id, None, "I make camp.")
            .await
            .expect("pipeline succeeds");
    }
}

//! Prompt assembly.
//!
//! Pure string construction: given game, roster, and history, produce the
//! system instructions and user prompt. No I/O, fully deterministic.

use lorekeeper_domain::{Game, PartyMember};

/// Speaker label for a turn the orchestrator could not attribute.
pub const UNATTRIBUTED_PLAYER: &str = "PLAYER";

/// Speaker label for generated narration.
pub const NARRATOR_SPEAKER: &str = "NARRATOR";

/// One prior turn with its speaker resolved to a display label.
#[derive(Debug, Clone)]
pub struct AttributedTurn {
    pub speaker: String,
    pub content: String,
}

/// The two strings a generation request is built from.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub system_instructions: String,
    pub user_prompt: String,
}

/// Build the narrator's system instructions.
///
/// These establish narrative authority, forbid delegating dice rolls to
/// the player, and spell out the exact control-payload format the state
/// mutation engine accepts.
pub fn system_instructions(game: &Game, roster: &[PartyMember]) -> String {
    let mut roster_block = String::new();
    for member in roster {
        roster_block.push_str(&format!(
            "- {} ({}) | Level {} | HP {}/{} | MP {}/{} | XP {}\n  Stats: {}\n  Condition: {:?}\n",
            member.name(),
            member.class_name(),
            member.level(),
            member.hp(),
            member.max_hp(),
            member.mp(),
            member.max_mp(),
            member.xp(),
            member.stats(),
            member.status_effects().labels(),
        ));
    }

    format!(
        r#"You are the narrator and referee of "{name}", a fantasy tabletop RPG.
You have sole authority over the world, its characters, and the outcome of every action.

Your players are:
{roster}
Narrate the adventure, adjudicate actions, and manage combat. Never ask a player to roll dice or resolve chance themselves: simulate any chance-based outcome yourself and narrate the result.

IMPORTANT: You have the power to update character stats and grant loot.
If a character takes damage, heals, spends or recovers mana, gains experience, or gains or loses a status effect, you MUST include a JSON block at the end of your response like this:
```json
{{
  "updates": [
    {{ "characterName": "Sorian", "hpChange": -5, "mpChange": -2, "xpChange": 25 }},
    {{ "characterName": "Sorian", "statusEffect": "Poisoned", "action": "add" }}
  ],
  "loot": [
    {{ "characterName": "Sorian", "itemName": "Healing Potion", "quantity": 1, "description": "Restores a little vitality." }}
  ]
}}
```
Rules for the JSON block:
- "updates" is required (it may be an empty list); "loot" is optional.
- Every update needs "characterName"; "hpChange", "mpChange" and "xpChange" are optional signed integers.
- "statusEffect" names an effect and "action" must be "add" or "remove".
- Every loot entry needs "characterName" and "itemName"; "quantity" defaults to 1 and must be positive; "description" is used only for new items.
- Use the exact character names listed above.
Omit the block entirely when nothing changes.

Keep your narration engaging but concise."#,
        name = game.name(),
        roster = roster_block,
    )
}

/// Build the user prompt from the bounded history and the new action.
pub fn user_prompt(
    game: &Game,
    history: &[AttributedTurn],
    actor_name: &str,
    message: &str,
) -> String {
    let mut prompt = String::new();

    if !game.setting().is_empty() {
        prompt.push_str(&format!("Setting: {}\n\n", game.setting()));
    }

    prompt.push_str("Current Story:\n");
    for turn in history {
        prompt.push_str(&format!("{}: {}\n", turn.speaker, turn.content));
    }

    prompt.push_str(&format!(
        "\n{actor}: {message}\n\n{narrator}:",
        actor = actor_name,
        narrator = NARRATOR_SPEAKER,
    ));
    prompt
}

/// Assemble both prompt halves.
pub fn assemble(
    game: &Game,
    roster: &[PartyMember],
    history: &[AttributedTurn],
    actor_name: &str,
    message: &str,
) -> AssembledPrompt {
    AssembledPrompt {
        system_instructions: system_instructions(game, roster),
        user_prompt: user_prompt(game, history, actor_name, message),
    }
}

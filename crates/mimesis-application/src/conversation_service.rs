//! Multi-persona conversations: each speaker answers the previous line.

use crate::response_pipeline::ResponsePipeline;
use mimesis_core::dialogue::{EliminationGame, EliminationResult, TurnScheduler};
use mimesis_core::error::{PersonaError, Result};
use mimesis_core::persona::VersionKey;
use rand::RngCore;
use serde::Serialize;
use std::sync::Arc;

/// One line of a scripted conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptLine {
    pub speaker: String,
    pub response: String,
}

/// Drives a round-robin conversation between personas.
pub struct ConversationService {
    pipeline: Arc<ResponsePipeline>,
    game: EliminationGame,
}

impl ConversationService {
    pub fn new(pipeline: Arc<ResponsePipeline>, game: EliminationGame) -> Self {
        Self { pipeline, game }
    }

    /// Plays rock-paper-scissors among `roster` to pick who speaks first.
    ///
    /// The first of the joint winners, in roster order, opens.
    pub fn pick_opener<R: RngCore + ?Sized>(
        &self,
        roster: &[String],
        rng: &mut R,
    ) -> Result<(String, EliminationResult)> {
        let result = self.game.play(roster, rng)?;
        let opener = result
            .winners
            .first()
            .cloned()
            .ok_or(PersonaError::EmptyRoster)?;
        Ok((opener, result))
    }

    /// Runs `lines` turns among the `date` versions of `roster`.
    ///
    /// The first speaker answers `opening`; every later speaker answers the
    /// line before. With `rng`, an elimination round decides who opens;
    /// otherwise the roster order does. Any failure stops the script.
    pub async fn run_script(
        &self,
        roster: &[String],
        date: &str,
        opening: &str,
        lines: usize,
        rng: Option<&mut (dyn RngCore + Send)>,
    ) -> Result<Vec<ScriptLine>> {
        if roster.is_empty() {
            return Err(PersonaError::EmptyRoster);
        }

        let mut scheduler = TurnScheduler::new(roster.iter().cloned());
        if let Some(rng) = rng {
            let (opener, result) = self.pick_opener(scheduler.participants(), rng)?;
            tracing::info!(opener = %opener, rounds = result.rounds, "opening speaker chosen");
            scheduler.seek(&opener);
        }

        let mut script = Vec::with_capacity(lines);
        let mut message = opening.to_string();
        for _ in 0..lines {
            let speaker = scheduler.next_participant()?;
            let key = VersionKey::new(speaker.clone(), date)?;
            let response = self.pipeline.respond(&key, &message, None).await?;
            tracing::debug!(speaker = %speaker, "script line");

            message = response.clone();
            script.push(ScriptLine { speaker, response });
        }
        Ok(script)
    }
}

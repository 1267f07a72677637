use rand::Rng;
use spin_core::*;
use spin_database::*;
use spin_lobby::*;

/// Agent autoplay.
///
/// When the current seat of an ACTIVE match belongs to an agent, rolls
/// for it through the identical [`Lobby::roll`] path a human uses, so
/// turn ownership is validated the same way. Agents only act in matches
/// with at least one human seated; an all-agent table is left to the
/// timeout supervisor.
#[derive(Clone)]
pub struct Autoplay {
    lobby: Lobby,
}

impl Autoplay {
    pub fn new(lobby: Lobby) -> Self {
        Self { lobby }
    }

    /// Background scan with 5..=7 s jitter between passes.
    pub async fn autoplay_loop(self) {
        loop {
            let secs =
                rand::rng().random_range(AUTOPLAY_INTERVAL_SECS.0..=AUTOPLAY_INTERVAL_SECS.1);
            tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
            if let Err(e) = self.roll_pass().await {
                log::warn!("[autoplay] pass failed: {}", e);
            }
        }
    }

    async fn roll_pass(&self) -> Result<(), MatchError> {
        let client = self.lobby.db().conn().await?;
        let matches = client.active_matches().await?;
        drop(client);
        for m in matches {
            if !m.has_human() {
                continue;
            }
            let seat = match m.occupant(m.live_turn()) {
                Some(uid) if uid.is_agent() => uid,
                _ => continue,
            };
            match self.lobby.roll(Caller::Agent(seat), m.id).await {
                Ok(_) => log::info!("[autoplay] agent {} rolled in {}", seat, m.id),
                // Stale scan data: someone else moved first. Harmless.
                Err(MatchError::Conflict(_)) => {}
                Err(e) => log::warn!("[autoplay] {} agent {}: {}", m.id, seat, e),
            }
        }
        Ok(())
    }
}

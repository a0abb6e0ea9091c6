//! Session collaborator contract and the best-effort sync facade

use crate::core::Side;
use crate::game::dice::{seeded, RandomSource};
use crate::game::events::{EventSink, MatchEvent};
use crate::game::probability::{ActionProbabilities, QuestionModifier};
use crate::game::ActionKind;
use crate::loader::config::Difficulty;
use crate::remote::RemoteError;
use rand_chacha::ChaCha12Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Max score used when no session service answers
pub const FALLBACK_MAX_SCORE: u32 = 5;

/// Session parameters handed to the engine at kickoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub max_score: u32,
    pub max_actions_hint: u32,
}

/// Informational reply to a recorded action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    pub probability: f64,
    pub success: bool,
}

/// Base probabilities the session service uses for its own bookkeeping
pub fn service_probabilities() -> ActionProbabilities {
    ActionProbabilities {
        pass: 0.75,
        dribble: 0.55,
        shoot: 0.45,
        tackle: 0.50,
    }
}

/// Remote session bookkeeping
pub trait SessionService {
    fn start_session(&mut self, difficulty: Difficulty) -> Result<SessionInfo, RemoteError>;

    fn record_action(
        &mut self,
        session_id: &str,
        kind: ActionKind,
        question_correct: bool,
    ) -> Result<ActionReport, RemoteError>;

    fn record_goal(&mut self, session_id: &str, side: Side, points: u32) -> Result<(), RemoteError>;
}

/// A service that is never reachable
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineService;

impl SessionService for OfflineService {
    fn start_session(&mut self, _difficulty: Difficulty) -> Result<SessionInfo, RemoteError> {
        Err(RemoteError::Unavailable("offline".to_string()))
    }

    fn record_action(
        &mut self,
        _session_id: &str,
        _kind: ActionKind,
        _question_correct: bool,
    ) -> Result<ActionReport, RemoteError> {
        Err(RemoteError::Unavailable("offline".to_string()))
    }

    fn record_goal(&mut self, _session_id: &str, _side: Side, _points: u32) -> Result<(), RemoteError> {
        Err(RemoteError::Unavailable("offline".to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub home_score: u32,
    pub away_score: u32,
    pub actions: u32,
    pub max_score: u32,
    pub max_actions: u32,
}

/// In-process session service with the backend's rules
///
/// Draws the max score 3/4/5/6 with odds 30/30/30/10 and the action hint
/// from the difficulty table; tracks scores per session.
pub struct LocalSessionService {
    sessions: FxHashMap<String, SessionRecord>,
    next_id: u64,
    rng: ChaCha12Rng,
    modifier: QuestionModifier,
}

impl LocalSessionService {
    pub fn new(seed: u64) -> Self {
        LocalSessionService {
            sessions: FxHashMap::default(),
            next_id: 1,
            rng: seeded(seed),
            modifier: QuestionModifier::default(),
        }
    }

    pub fn session(&self, session_id: &str) -> Option<&SessionRecord> {
        self.sessions.get(session_id)
    }

    fn draw_max_score(&mut self) -> u32 {
        let roll = self.rng.next_unit();
        if roll < 0.30 {
            3
        } else if roll < 0.60 {
            4
        } else if roll < 0.90 {
            5
        } else {
            6
        }
    }

    fn record_mut(&mut self, session_id: &str) -> Result<&mut SessionRecord, RemoteError> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| RemoteError::NotFound(format!("session '{session_id}'")))
    }
}

impl SessionService for LocalSessionService {
    fn start_session(&mut self, difficulty: Difficulty) -> Result<SessionInfo, RemoteError> {
        let session_id = format!("session-{}", self.next_id);
        self.next_id += 1;
        let max_score = self.draw_max_score();
        let max_actions_hint = difficulty.draw_action_hint(&mut self.rng);
        self.sessions.insert(
            session_id.clone(),
            SessionRecord {
                max_score,
                max_actions: max_actions_hint,
                ..SessionRecord::default()
            },
        );
        Ok(SessionInfo {
            session_id,
            max_score,
            max_actions_hint,
        })
    }

    fn record_action(
        &mut self,
        session_id: &str,
        kind: ActionKind,
        question_correct: bool,
    ) -> Result<ActionReport, RemoteError> {
        let probability = self
            .modifier
            .adjust(service_probabilities().get(kind), question_correct);
        let success = self.rng.chance(probability);
        self.record_mut(session_id)?.actions += 1;
        Ok(ActionReport {
            probability,
            success,
        })
    }

    fn record_goal(&mut self, session_id: &str, side: Side, points: u32) -> Result<(), RemoteError> {
        let record = self.record_mut(session_id)?;
        match side {
            Side::Home => record.home_score += points,
            Side::Away => record.away_score += points,
        }
        Ok(())
    }
}

/// Best-effort mirror of a match to a session service
///
/// Every call succeeds: failures are logged and replaced by local values of
/// the same shape. Subscribed to the engine as an [`EventSink`] it records
/// goals and actions as they settle.
pub struct RemoteSync {
    service: Option<Box<dyn SessionService>>,
    session: Option<SessionInfo>,
    rng: ChaCha12Rng,
    modifier: QuestionModifier,
    last_report: Option<ActionReport>,
}

impl RemoteSync {
    pub fn new(service: Box<dyn SessionService>, seed: u64) -> Self {
        RemoteSync {
            service: Some(service),
            session: None,
            rng: seeded(seed),
            modifier: QuestionModifier::default(),
            last_report: None,
        }
    }

    /// Facade without any service; everything is synthesized locally
    pub fn offline(seed: u64) -> Self {
        RemoteSync {
            service: None,
            session: None,
            rng: seeded(seed),
            modifier: QuestionModifier::default(),
            last_report: None,
        }
    }

    pub fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    pub fn last_report(&self) -> Option<ActionReport> {
        self.last_report
    }

    pub fn start_match(&mut self, difficulty: Difficulty) -> SessionInfo {
        let remote = self
            .service
            .as_mut()
            .map(|service| service.start_session(difficulty));
        let info = match remote {
            Some(Ok(info)) => info,
            Some(Err(err)) => {
                log::warn!("start_session failed ({err}), using local session");
                self.local_session(difficulty)
            }
            None => self.local_session(difficulty),
        };
        self.session = Some(info.clone());
        info
    }

    fn local_session(&mut self, difficulty: Difficulty) -> SessionInfo {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        SessionInfo {
            session_id: format!("local-{epoch_ms}"),
            max_score: FALLBACK_MAX_SCORE,
            max_actions_hint: difficulty.draw_action_hint(&mut self.rng),
        }
    }

    /// Informational only; the engine rolls its own outcome
    pub fn record_action(&mut self, kind: ActionKind, question_correct: bool) -> ActionReport {
        let session_id = self.session_id();
        let remote = self
            .service
            .as_mut()
            .map(|service| service.record_action(&session_id, kind, question_correct));
        let report = match remote {
            Some(Ok(report)) => report,
            Some(Err(err)) => {
                log::debug!("record_action failed ({err}), computing locally");
                self.local_report(kind, question_correct)
            }
            None => self.local_report(kind, question_correct),
        };
        self.last_report = Some(report);
        report
    }

    fn local_report(&mut self, kind: ActionKind, question_correct: bool) -> ActionReport {
        let probability = self
            .modifier
            .adjust(service_probabilities().get(kind), question_correct);
        ActionReport {
            probability,
            success: self.rng.chance(probability),
        }
    }

    /// Fire and forget
    pub fn record_goal(&mut self, side: Side, points: u32) {
        let session_id = self.session_id();
        if let Some(service) = self.service.as_mut() {
            if let Err(err) = service.record_goal(&session_id, side, points) {
                log::warn!("record_goal failed ({err}), ignoring");
            }
        }
    }

    fn session_id(&self) -> String {
        self.session
            .as_ref()
            .map(|s| s.session_id.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RemoteSync {
    fn on_event(&mut self, event: &MatchEvent) {
        match event {
            MatchEvent::Goal { side, .. } => self.record_goal(*side, 1),
            MatchEvent::ActionResolved {
                kind,
                question_correct,
                outcome,
                ..
            } if outcome.was_charged() => {
                self.record_action(*kind, *question_correct);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_start_uses_fallback() {
        let mut sync = RemoteSync::new(Box::new(OfflineService), 4);
        let info = sync.start_match(Difficulty::Tiny);
        assert!(info.session_id.starts_with("local-"));
        assert_eq!(info.max_score, FALLBACK_MAX_SCORE);
        assert!((10..=15).contains(&info.max_actions_hint));
        assert_eq!(sync.session(), Some(&info));

        // fire-and-forget never panics or blocks
        sync.record_goal(Side::Home, 1);
        let report = sync.record_action(ActionKind::Shoot, true);
        assert!((report.probability - 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_local_service_tracks_scores() {
        let mut service = LocalSessionService::new(11);
        let info = service.start_session(Difficulty::Long).unwrap();
        assert!((3..=6).contains(&info.max_score));
        assert!((100..=120).contains(&info.max_actions_hint));

        service.record_goal(&info.session_id, Side::Away, 1).unwrap();
        service.record_action(&info.session_id, ActionKind::Pass, false).unwrap();
        let record = service.session(&info.session_id).unwrap();
        assert_eq!(record.away_score, 1);
        assert_eq!(record.actions, 1);

        assert!(matches!(
            service.record_goal("missing", Side::Home, 1),
            Err(RemoteError::NotFound(_))
        ));
    }

    #[test]
    fn test_max_score_distribution() {
        let mut service = LocalSessionService::new(99);
        let mut counts = [0u32; 7];
        for _ in 0..10_000 {
            counts[service.draw_max_score() as usize] += 1;
        }
        let rate = |n: usize| counts[n] as f64 / 10_000.0;
        assert!((rate(3) - 0.30).abs() < 0.03);
        assert!((rate(4) - 0.30).abs() < 0.03);
        assert!((rate(5) - 0.30).abs() < 0.03);
        assert!((rate(6) - 0.10).abs() < 0.03);
    }

    #[test]
    fn test_sync_as_event_sink() {
        let mut sync = RemoteSync::new(Box::new(LocalSessionService::new(1)), 1);
        let info = sync.start_match(Difficulty::Regular);
        sync.on_event(&MatchEvent::Goal {
            side: Side::Home,
            home_score: 1,
            away_score: 0,
        });
        assert_eq!(info.session_id, "session-1");
        assert!(sync.last_report().is_none());

        sync.on_event(&MatchEvent::ActionResolved {
            kind: ActionKind::Dribble,
            question_correct: true,
            outcome: crate::game::ActionOutcome::Resolved { success: true },
            action_count: 1,
        });
        let report = sync.last_report().unwrap();
        assert!((report.probability - 0.70).abs() < 1e-9);
    }
}

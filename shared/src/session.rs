//! Client-side auth session state machine
//!
//! The hosted auth provider delivers sign-in, refresh and sign-out events
//! asynchronously and sometimes more than once. `SessionMachine` folds those
//! events into a single [`AuthState`] and tells the caller which side effect
//! to run. Repeated events for the current user are no-ops, so a duplicate
//! `SIGNED_IN` never triggers a second profile fetch.
//!
//! `AuthListener` owns the machine together with the provider subscription;
//! dropping the listener unsubscribes exactly once.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::UserProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    Anonymous,
    /// Sign-in submitted or initial session being restored
    Authenticating,
    /// Provider session established; `profile` is `None` until fetched
    Authenticated {
        user_id: Uuid,
        profile: Option<UserProfile>,
    },
    Error {
        message: String,
    },
}

impl AuthState {
    fn name(&self) -> &'static str {
        match self {
            AuthState::Anonymous => "anonymous",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated { .. } => "authenticated",
            AuthState::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    /// The user submitted the login form
    SignInRequested,
    /// Provider finished restoring a stored session (or found none)
    InitialSession { user_id: Option<Uuid> },
    SignedIn { user_id: Uuid },
    TokenRefreshed { user_id: Uuid },
    SignedOut,
    SignInFailed { message: String },
    ProfileLoaded { profile: UserProfile },
    ProfileFailed { message: String },
}

impl AuthEvent {
    /// Map a provider callback (`onAuthStateChange(event, session)`) to an event
    pub fn from_provider(event: &str, user_id: Option<Uuid>) -> Result<Self, SessionError> {
        let require_user = |event: &str| user_id.ok_or_else(|| SessionError::MissingUser(event.to_string()));

        match event {
            "INITIAL_SESSION" => Ok(AuthEvent::InitialSession { user_id }),
            "SIGNED_IN" | "PASSWORD_RECOVERY" => Ok(AuthEvent::SignedIn {
                user_id: require_user(event)?,
            }),
            "TOKEN_REFRESHED" | "USER_UPDATED" => Ok(AuthEvent::TokenRefreshed {
                user_id: require_user(event)?,
            }),
            "SIGNED_OUT" | "USER_DELETED" => Ok(AuthEvent::SignedOut),
            other => Err(SessionError::UnknownEvent(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignInRequested => "sign_in_requested",
            AuthEvent::InitialSession { .. } => "initial_session",
            AuthEvent::SignedIn { .. } => "signed_in",
            AuthEvent::TokenRefreshed { .. } => "token_refreshed",
            AuthEvent::SignedOut => "signed_out",
            AuthEvent::SignInFailed { .. } => "sign_in_failed",
            AuthEvent::ProfileLoaded { .. } => "profile_loaded",
            AuthEvent::ProfileFailed { .. } => "profile_failed",
        }
    }
}

/// Side effect the caller must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum AuthEffect {
    None,
    FetchProfile { user_id: Uuid },
    ClearProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown auth event: {0}")]
    UnknownEvent(String),

    #[error("auth event {0} carried no user")]
    MissingUser(String),

    #[error("cannot handle {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

/// Auth session state machine
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMachine {
    state: AuthState,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    /// Starts in `Authenticating` while the provider restores any stored session
    pub fn new() -> Self {
        Self {
            state: AuthState::Authenticating,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { .. })
    }

    /// True until both the provider session and the profile are settled
    pub fn is_loading(&self) -> bool {
        matches!(
            self.state,
            AuthState::Authenticating | AuthState::Authenticated { profile: None, .. }
        )
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match &self.state {
            AuthState::Authenticated { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }

    /// Apply an event. On error the state is left unchanged.
    pub fn handle(&mut self, event: AuthEvent) -> Result<AuthEffect, SessionError> {
        let event_name = event.name();
        let (next, effect) = transition(&self.state, event)?;
        if next != self.state {
            tracing::debug!(from = self.state.name(), to = next.name(), event = event_name, "auth state transition");
            self.state = next;
        }
        Ok(effect)
    }
}

fn transition(state: &AuthState, event: AuthEvent) -> Result<(AuthState, AuthEffect), SessionError> {
    use AuthEffect as Fx;
    use AuthState as S;

    let unchanged = || -> Result<(AuthState, AuthEffect), SessionError> { Ok((state.clone(), Fx::None)) };

    match event {
        AuthEvent::SignedOut => {
            let effect = if matches!(state, S::Authenticated { .. }) {
                Fx::ClearProfile
            } else {
                Fx::None
            };
            Ok((S::Anonymous, effect))
        }

        AuthEvent::SignedIn { user_id }
        | AuthEvent::TokenRefreshed { user_id }
        | AuthEvent::InitialSession {
            user_id: Some(user_id),
        } => match state {
            S::Authenticated { user_id: current, .. } if *current == user_id => unchanged(),
            _ => Ok((
                S::Authenticated {
                    user_id,
                    profile: None,
                },
                Fx::FetchProfile { user_id },
            )),
        },

        AuthEvent::InitialSession { user_id: None } => match state {
            S::Authenticated { .. } => Ok((S::Anonymous, Fx::ClearProfile)),
            S::Error { .. } => unchanged(),
            _ => Ok((S::Anonymous, Fx::None)),
        },

        AuthEvent::SignInRequested => match state {
            S::Anonymous | S::Error { .. } => Ok((S::Authenticating, Fx::None)),
            S::Authenticating => unchanged(),
            S::Authenticated { .. } => Err(SessionError::InvalidTransition {
                state: state.name(),
                event: "sign_in_requested",
            }),
        },

        AuthEvent::SignInFailed { message } => match state {
            // A late failure after the provider already confirmed a session is stale
            S::Authenticated { .. } => unchanged(),
            _ => Ok((S::Error { message }, Fx::None)),
        },

        AuthEvent::ProfileLoaded { profile } => match state {
            S::Authenticated { user_id, .. } if *user_id == profile.id => {
                if profile.is_active {
                    Ok((
                        S::Authenticated {
                            user_id: *user_id,
                            profile: Some(profile),
                        },
                        Fx::None,
                    ))
                } else {
                    Ok((
                        S::Error {
                            message: "account is deactivated".to_string(),
                        },
                        Fx::ClearProfile,
                    ))
                }
            }
            _ => unchanged(),
        },

        AuthEvent::ProfileFailed { message } => match state {
            S::Authenticated { profile: None, .. } => Ok((S::Error { message }, Fx::None)),
            _ => unchanged(),
        },
    }
}

/// Provider subscription that is released exactly once
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.unsubscribe.is_some()
    }

    /// Release now instead of on drop
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// The single auth-state subscription of a client together with its machine
#[derive(Debug)]
pub struct AuthListener {
    machine: SessionMachine,
    subscription: Subscription,
}

impl AuthListener {
    pub fn new(subscription: Subscription) -> Self {
        Self {
            machine: SessionMachine::new(),
            subscription,
        }
    }

    pub fn handle(&mut self, event: AuthEvent) -> Result<AuthEffect, SessionError> {
        self.machine.handle(event)
    }

    /// Feed a raw provider callback
    pub fn handle_provider_event(&mut self, event: &str, user_id: Option<Uuid>) -> Result<AuthEffect, SessionError> {
        self.machine.handle(AuthEvent::from_provider(event, user_id)?)
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    pub fn state(&self) -> &AuthState {
        self.machine.state()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    /// Tear down explicitly; dropping the listener has the same effect
    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::models::UserRole;

    fn profile(id: Uuid, is_active: bool) -> UserProfile {
        UserProfile {
            id,
            email: "chef@example.com".to_string(),
            name: "Chef".to_string(),
            role: UserRole::Manager,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn signed_in(machine: &mut SessionMachine, user_id: Uuid) {
        machine.handle(AuthEvent::SignedIn { user_id }).unwrap();
    }

    #[test]
    fn starts_loading() {
        let machine = SessionMachine::new();
        assert_eq!(machine.state(), &AuthState::Authenticating);
        assert!(machine.is_loading());
    }

    #[test]
    fn initial_session_without_user_is_anonymous() {
        let mut machine = SessionMachine::new();
        let effect = machine.handle(AuthEvent::InitialSession { user_id: None }).unwrap();
        assert_eq!(effect, AuthEffect::None);
        assert_eq!(machine.state(), &AuthState::Anonymous);
        assert!(!machine.is_loading());
    }

    #[test]
    fn sign_in_fetches_profile_once() {
        let user_id = Uuid::new_v4();
        let mut machine = SessionMachine::new();

        let first = machine.handle(AuthEvent::SignedIn { user_id }).unwrap();
        let duplicate = machine.handle(AuthEvent::SignedIn { user_id }).unwrap();
        let refreshed = machine.handle(AuthEvent::TokenRefreshed { user_id }).unwrap();

        assert_eq!(first, AuthEffect::FetchProfile { user_id });
        assert_eq!(duplicate, AuthEffect::None);
        assert_eq!(refreshed, AuthEffect::None);
    }

    #[test]
    fn profile_load_completes_authentication() {
        let user_id = Uuid::new_v4();
        let mut machine = SessionMachine::new();
        signed_in(&mut machine, user_id);
        assert!(machine.is_loading());

        machine
            .handle(AuthEvent::ProfileLoaded {
                profile: profile(user_id, true),
            })
            .unwrap();

        assert!(machine.is_authenticated());
        assert!(!machine.is_loading());
        assert_eq!(machine.profile().map(|p| p.id), Some(user_id));
    }

    #[test]
    fn duplicate_sign_in_keeps_loaded_profile() {
        let user_id = Uuid::new_v4();
        let mut machine = SessionMachine::new();
        signed_in(&mut machine, user_id);
        machine
            .handle(AuthEvent::ProfileLoaded {
                profile: profile(user_id, true),
            })
            .unwrap();

        signed_in(&mut machine, user_id);
        assert!(machine.profile().is_some());
    }

    #[test]
    fn stale_profile_for_another_user_is_ignored() {
        let user_id = Uuid::new_v4();
        let mut machine = SessionMachine::new();
        signed_in(&mut machine, user_id);

        machine
            .handle(AuthEvent::ProfileLoaded {
                profile: profile(Uuid::new_v4(), true),
            })
            .unwrap();

        assert!(machine.profile().is_none());
        assert!(machine.is_loading());
    }

    #[test]
    fn switching_user_refetches() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut machine = SessionMachine::new();
        signed_in(&mut machine, first);

        let effect = machine.handle(AuthEvent::SignedIn { user_id: second }).unwrap();
        assert_eq!(effect, AuthEffect::FetchProfile { user_id: second });
    }

    #[test]
    fn inactive_profile_is_an_error() {
        let user_id = Uuid::new_v4();
        let mut machine = SessionMachine::new();
        signed_in(&mut machine, user_id);

        let effect = machine
            .handle(AuthEvent::ProfileLoaded {
                profile: profile(user_id, false),
            })
            .unwrap();

        assert_eq!(effect, AuthEffect::ClearProfile);
        assert!(matches!(machine.state(), AuthState::Error { .. }));
    }

    #[test]
    fn sign_out_clears_only_when_authenticated() {
        let mut machine = SessionMachine::new();
        machine.handle(AuthEvent::InitialSession { user_id: None }).unwrap();
        assert_eq!(machine.handle(AuthEvent::SignedOut).unwrap(), AuthEffect::None);

        signed_in(&mut machine, Uuid::new_v4());
        assert_eq!(machine.handle(AuthEvent::SignedOut).unwrap(), AuthEffect::ClearProfile);
        assert_eq!(machine.state(), &AuthState::Anonymous);
    }

    #[test]
    fn failed_sign_in_then_retry() {
        let mut machine = SessionMachine::new();
        machine.handle(AuthEvent::InitialSession { user_id: None }).unwrap();
        machine.handle(AuthEvent::SignInRequested).unwrap();
        machine
            .handle(AuthEvent::SignInFailed {
                message: "Invalid login credentials".to_string(),
            })
            .unwrap();
        assert!(matches!(machine.state(), AuthState::Error { .. }));

        machine.handle(AuthEvent::SignInRequested).unwrap();
        assert_eq!(machine.state(), &AuthState::Authenticating);
    }

    #[test]
    fn sign_in_request_while_authenticated_is_rejected() {
        let mut machine = SessionMachine::new();
        signed_in(&mut machine, Uuid::new_v4());
        let before = machine.clone();

        let err = machine.handle(AuthEvent::SignInRequested).unwrap_err();

        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(machine, before);
    }

    #[test]
    fn provider_event_mapping() {
        let user_id = Uuid::new_v4();
        assert_eq!(
            AuthEvent::from_provider("SIGNED_IN", Some(user_id)).unwrap(),
            AuthEvent::SignedIn { user_id }
        );
        assert_eq!(AuthEvent::from_provider("SIGNED_OUT", None).unwrap(), AuthEvent::SignedOut);
        assert!(matches!(
            AuthEvent::from_provider("SIGNED_IN", None),
            Err(SessionError::MissingUser(_))
        ));
        assert!(matches!(
            AuthEvent::from_provider("MFA_CHALLENGE", None),
            Err(SessionError::UnknownEvent(_))
        ));
    }

    #[test]
    fn listener_unsubscribes_once_on_drop() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut listener = AuthListener::new(Subscription::new(move || counter.set(counter.get() + 1)));

        let effect = listener
            .handle_provider_event("SIGNED_IN", Some(Uuid::new_v4()))
            .unwrap();
        assert!(matches!(effect, AuthEffect::FetchProfile { .. }));
        assert!(listener.is_subscribed());

        listener.close();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn explicit_unsubscribe_does_not_repeat_on_drop() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let subscription = Subscription::new(move || counter.set(counter.get() + 1));

        subscription.unsubscribe();
        assert_eq!(calls.get(), 1);
    }
}

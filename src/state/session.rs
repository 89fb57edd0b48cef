//! Which conversation are we in.

use tracing::{debug, info};

use crate::models::SessionId;

/// Single source of truth for the current session identity.
///
/// Both transports read from and write to this one register. An identity
/// asserted by the backend on either channel, or picked by the user, always
/// replaces whatever was there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionRegister {
    current: Option<SessionId>,
}

impl SessionRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` current. Returns the identity it replaced, if any.
    pub fn adopt(&mut self, id: SessionId) -> Option<SessionId> {
        let previous = self.current.replace(id);
        match (&previous, &self.current) {
            (Some(old), Some(new)) if old != new => {
                info!("Session identity changed: {} -> {}", old, new)
            }
            (None, Some(new)) => info!("Session identity adopted: {}", new),
            _ => {}
        }
        previous
    }

    /// Forget the current identity; the next request lets the backend mint one.
    pub fn clear(&mut self) -> Option<SessionId> {
        let previous = self.current.take();
        if let Some(ref old) = previous {
            debug!("Session identity cleared (was {})", old);
        }
        previous
    }

    /// Identity to attach to an outgoing chat turn or upload.
    pub fn resolve_for_request(&self) -> Option<SessionId> {
        self.current.clone()
    }

    pub fn current(&self) -> Option<&SessionId> {
        self.current.as_ref()
    }

    pub fn is_current(&self, id: &SessionId) -> bool {
        self.current.as_ref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let register = SessionRegister::new();
        assert_eq!(register.current(), None);
        assert_eq!(register.resolve_for_request(), None);
    }

    #[test]
    fn test_adopt_overwrites() {
        let mut register = SessionRegister::new();
        assert_eq!(register.adopt(SessionId::new("pending-1")), None);
        assert_eq!(
            register.adopt(SessionId::new("S1")),
            Some(SessionId::new("pending-1"))
        );
        assert_eq!(register.resolve_for_request(), Some(SessionId::new("S1")));
        assert!(register.is_current(&SessionId::new("S1")));
        assert!(!register.is_current(&SessionId::new("pending-1")));
    }

    #[test]
    fn test_adopt_same_id_is_stable() {
        let mut register = SessionRegister::new();
        register.adopt(SessionId::new("S1"));
        assert_eq!(
            register.adopt(SessionId::new("S1")),
            Some(SessionId::new("S1"))
        );
        assert_eq!(register.current(), Some(&SessionId::new("S1")));
    }

    #[test]
    fn test_clear() {
        let mut register = SessionRegister::new();
        register.adopt(SessionId::new("S1"));
        assert_eq!(register.clear(), Some(SessionId::new("S1")));
        assert_eq!(register.resolve_for_request(), None);
        assert_eq!(register.clear(), None);
    }
}

// Queue Domain Model
//
// A queue is never stored as an object of its own. It exists implicitly
// through its two ordered sets, whose key names are produced here and
// nowhere else.

/// Queue name
pub type QueueName = String;

/// Queue used when the caller does not name one
pub const DEFAULT_QUEUE: &str = "default";

const DEFAULT_KEY_PREFIX: &str = "users:queue";
const WAIT_SUFFIX: &str = "wait";
const PROCEED_SUFFIX: &str = "proceed";
const SEPARATOR: char = ':';

/// Maps queue names to store keys
///
/// Layout: `{prefix}:{queue}:wait` and `{prefix}:{queue}:proceed`.
///
/// Queue names must not contain `:` or glob metacharacters (`*`, `?`, `[`, `]`).
/// This type does not enforce it; outer layers call [`QueueKeyspace::is_valid_queue_name`]
/// before handing a name to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueKeyspace {
    prefix: String,
}

impl Default for QueueKeyspace {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

impl QueueKeyspace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn wait(&self, queue: &str) -> String {
        format!("{}{SEPARATOR}{}{SEPARATOR}{WAIT_SUFFIX}", self.prefix, queue)
    }

    pub fn proceed(&self, queue: &str) -> String {
        format!("{}{SEPARATOR}{}{SEPARATOR}{PROCEED_SUFFIX}", self.prefix, queue)
    }

    /// Glob pattern matching every wait key in this keyspace
    pub fn wait_pattern(&self) -> String {
        self.wait("*")
    }

    /// Recover the queue name from a wait key (left inverse of [`QueueKeyspace::wait`])
    ///
    /// Returns `None` for keys outside this keyspace, proceed keys, and keys
    /// whose middle segment is not a valid queue name.
    pub fn queue_from_wait_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        let rest = key
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix(SEPARATOR)?;
        let queue = rest
            .strip_suffix(WAIT_SUFFIX)?
            .strip_suffix(SEPARATOR)?;

        Self::is_valid_queue_name(queue).then_some(queue)
    }

    /// Check that a queue name round-trips through the keyspace
    pub fn is_valid_queue_name(queue: &str) -> bool {
        !queue.is_empty()
            && !queue
                .chars()
                .any(|c| matches!(c, ':' | '*' | '?' | '[' | ']') || c.is_control())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let keys = QueueKeyspace::default();
        assert_eq!(keys.wait("default"), "users:queue:default:wait");
        assert_eq!(keys.proceed("default"), "users:queue:default:proceed");
        assert_eq!(keys.wait_pattern(), "users:queue:*:wait");
    }

    #[test]
    fn test_extract_is_left_inverse_of_wait() {
        let keys = QueueKeyspace::default();
        for queue in ["default", "concert-2026", "a", "seoul_dome.vip"] {
            assert_eq!(keys.queue_from_wait_key(&keys.wait(queue)), Some(queue));
        }
    }

    #[test]
    fn test_extract_rejects_foreign_keys() {
        let keys = QueueKeyspace::default();
        assert_eq!(keys.queue_from_wait_key("users:queue:default:proceed"), None);
        assert_eq!(keys.queue_from_wait_key("other:queue:default:wait"), None);
        assert_eq!(keys.queue_from_wait_key("users:queue::wait"), None);
        assert_eq!(keys.queue_from_wait_key("users:queue:a:b:wait"), None);
    }

    #[test]
    fn test_wait_and_proceed_never_collide() {
        let keys = QueueKeyspace::default();
        assert_ne!(keys.wait("x"), keys.proceed("x"));
        assert_ne!(keys.wait("x"), keys.wait("y"));
    }

    #[test]
    fn test_custom_prefix() {
        let keys = QueueKeyspace::new("staging:rooms");
        let key = keys.wait("launch");
        assert_eq!(key, "staging:rooms:launch:wait");
        assert_eq!(keys.queue_from_wait_key(&key), Some("launch"));
        assert_eq!(QueueKeyspace::default().queue_from_wait_key(&key), None);
    }

    #[test]
    fn test_queue_name_validation() {
        assert!(QueueKeyspace::is_valid_queue_name("default"));
        assert!(!QueueKeyspace::is_valid_queue_name(""));
        assert!(!QueueKeyspace::is_valid_queue_name("a:b"));
        assert!(!QueueKeyspace::is_valid_queue_name("a*"));
        assert!(!QueueKeyspace::is_valid_queue_name("q[1]"));
    }
}

/// Notification rules
///
/// Pure functions from a mutation (plus the state around it) to zero or
/// one notification to persist. Keeping the rules side-effect-free lets
/// handlers insert the result inside the same transaction as the mutation
/// that triggered it, and makes every suppression case unit-testable:
///
/// - `assigned` fires only when a reassignment actually changes the
///   assignee and the new assignee is not the acting user.
/// - `comment` fires only when the task is assigned to someone other than
///   the comment's author.
/// - `due_soon` fires for any assigned, unfinished task; the per-day
///   dedup belongs to the caller ([`scan`]), not to the rule.
///
/// Messages are rendered here, once, at creation time.
///
/// # Example
///
/// ```
/// use taskdeck_shared::notify::comment_excerpt;
///
/// assert_eq!(comment_excerpt("short"), "short");
/// assert_eq!(comment_excerpt(&"x".repeat(60)), format!("{}...", "x".repeat(50)));
/// ```

pub mod scan;

use uuid::Uuid;

use crate::models::notification::{CreateNotification, NotificationKind};
use crate::models::task::Task;
use crate::models::user::User;

/// Maximum comment length quoted in a notification message
const EXCERPT_MAX_CHARS: usize = 50;

/// Returns a length-capped excerpt of a comment body
///
/// Bodies longer than 50 characters are cut to the first 50 characters
/// followed by `...`; shorter bodies are returned verbatim.
pub fn comment_excerpt(content: &str) -> String {
    if content.chars().count() > EXCERPT_MAX_CHARS {
        let head: String = content.chars().take(EXCERPT_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

/// Reacts to a task reassignment
///
/// Emits an `assigned` notification for the new assignee iff the assignee
/// is set, actually changed, and is not the actor (no self-notification).
pub fn on_task_assigned(
    task: &Task,
    old_assignee_id: Option<Uuid>,
    new_assignee_id: Option<Uuid>,
    actor: &User,
) -> Option<CreateNotification> {
    let new_assignee_id = new_assignee_id?;

    if Some(new_assignee_id) == old_assignee_id || new_assignee_id == actor.id {
        return None;
    }

    Some(CreateNotification {
        user_id: new_assignee_id,
        task_id: Some(task.id),
        kind: NotificationKind::Assigned,
        message: format!("{} assigned \"{}\" to you", actor.name, task.title),
    })
}

/// Reacts to a new comment
///
/// Emits a `comment` notification for the task's assignee iff the task is
/// assigned to someone other than the comment's author.
pub fn on_comment_created(task: &Task, content: &str, author: &User) -> Option<CreateNotification> {
    let assignee_id = task.assignee_id?;

    if assignee_id == author.id {
        return None;
    }

    Some(CreateNotification {
        user_id: assignee_id,
        task_id: Some(task.id),
        kind: NotificationKind::Comment,
        message: format!(
            "{} commented on \"{}\": {}",
            author.name,
            task.title,
            comment_excerpt(content)
        ),
    })
}

/// Reacts to a task crossing a due-date threshold
///
/// Emits a `due_soon` notification for the assignee; None for unassigned
/// tasks. Same-day deduplication is the scanner's responsibility.
pub fn on_due_soon(task: &Task, days_before: i64) -> Option<CreateNotification> {
    let assignee_id = task.assignee_id?;

    let message = match days_before {
        0 => format!("\"{}\" is due today!", task.title),
        1 => format!("\"{}\" is due tomorrow", task.title),
        n => format!("\"{}\" is due in {} days", task.title, n),
    };

    Some(CreateNotification {
        user_id: assignee_id,
        task_id: Some(task.id),
        kind: NotificationKind::DueSoon,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", name),
            name: name.to_string(),
            password_hash: "hash".to_string(),
            avatar: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn task(title: &str, assignee_id: Option<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            status: "todo".to_string(),
            priority: "medium".to_string(),
            due_date: None,
            start_time: None,
            end_time: None,
            assignee_id,
            project_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_excerpt_short_body_verbatim() {
        assert_eq!(comment_excerpt("hello"), "hello");
    }

    #[test]
    fn test_excerpt_boundary() {
        let exactly_50 = "a".repeat(50);
        assert_eq!(comment_excerpt(&exactly_50), exactly_50);

        let body_51 = "b".repeat(51);
        let expected = format!("{}...", "b".repeat(50));
        assert_eq!(comment_excerpt(&body_51), expected);
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let body: String = "あ".repeat(51);
        let excerpt = comment_excerpt(&body);
        assert_eq!(excerpt.chars().count(), 53);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_assigned_fires_for_changed_assignee() {
        let actor = user("alice");
        let carol = user("carol");
        let bob = user("bob");
        let t = task("Ship it", Some(carol.id));

        let n = on_task_assigned(&t, Some(bob.id), Some(carol.id), &actor).unwrap();
        assert_eq!(n.user_id, carol.id);
        assert_eq!(n.kind, NotificationKind::Assigned);
        assert_eq!(n.message, "alice assigned \"Ship it\" to you");
    }

    #[test]
    fn test_assigned_suppressed_for_self_assignment() {
        let actor = user("alice");
        let bob = user("bob");
        let t = task("Ship it", Some(actor.id));

        assert!(on_task_assigned(&t, Some(bob.id), Some(actor.id), &actor).is_none());
    }

    #[test]
    fn test_assigned_suppressed_when_unchanged() {
        let actor = user("alice");
        let bob = user("bob");
        let t = task("Ship it", Some(bob.id));

        assert!(on_task_assigned(&t, Some(bob.id), Some(bob.id), &actor).is_none());
    }

    #[test]
    fn test_assigned_suppressed_when_cleared() {
        let actor = user("alice");
        let bob = user("bob");
        let t = task("Ship it", None);

        assert!(on_task_assigned(&t, Some(bob.id), None, &actor).is_none());
    }

    #[test]
    fn test_comment_fires_for_other_assignee() {
        let author = user("alice");
        let bob = user("bob");
        let t = task("Ship it", Some(bob.id));

        let n = on_comment_created(&t, "looks good to me", &author).unwrap();
        assert_eq!(n.user_id, bob.id);
        assert_eq!(n.kind, NotificationKind::Comment);
        assert_eq!(
            n.message,
            "alice commented on \"Ship it\": looks good to me"
        );
    }

    #[test]
    fn test_comment_suppressed_for_own_task() {
        let author = user("alice");
        let t = task("Ship it", Some(author.id));

        assert!(on_comment_created(&t, "note to self", &author).is_none());
    }

    #[test]
    fn test_comment_suppressed_for_unassigned_task() {
        let author = user("alice");
        let t = task("Ship it", None);

        assert!(on_comment_created(&t, "anyone?", &author).is_none());
    }

    #[test]
    fn test_comment_message_truncates_long_body() {
        let author = user("alice");
        let bob = user("bob");
        let t = task("Ship it", Some(bob.id));
        let body = "c".repeat(80);

        let n = on_comment_created(&t, &body, &author).unwrap();
        let expected = format!("alice commented on \"Ship it\": {}...", "c".repeat(50));
        assert_eq!(n.message, expected);
    }

    #[test]
    fn test_due_soon_messages_per_threshold() {
        let bob = user("bob");
        let t = task("File taxes", Some(bob.id));

        assert_eq!(
            on_due_soon(&t, 0).unwrap().message,
            "\"File taxes\" is due today!"
        );
        assert_eq!(
            on_due_soon(&t, 1).unwrap().message,
            "\"File taxes\" is due tomorrow"
        );
        assert_eq!(
            on_due_soon(&t, 3).unwrap().message,
            "\"File taxes\" is due in 3 days"
        );
    }

    #[test]
    fn test_due_soon_requires_assignee() {
        let t = task("File taxes", None);
        assert!(on_due_soon(&t, 1).is_none());
    }
}

//! Human-readable console output for `bnetctl`.

use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::db::ErrorKind;
use crate::users::{role_icon, role_label, User};

const WIDTH: usize = 80;

pub fn rule() {
    println!("{}", "=".repeat(WIDTH));
}

pub fn banner(title: &str) {
    rule();
    println!("{title}");
    rule();
    println!();
}

pub fn step(n: usize, title: &str) {
    println!();
    println!("Step {n}: {title}");
}

pub fn ok(msg: impl AsRef<str>) {
    println!("   ✅ {}", msg.as_ref());
}

pub fn warn(msg: impl AsRef<str>) {
    println!("   ⚠️  {}", msg.as_ref());
}

pub fn fail(msg: impl AsRef<str>) {
    println!("   ❌ {}", msg.as_ref());
}

pub fn info(msg: impl AsRef<str>) {
    println!("   ℹ️  {}", msg.as_ref());
}

pub fn hints(kind: ErrorKind) {
    println!("   💡 Check:");
    for hint in kind.hint() {
        println!("      - {hint}");
    }
}

/// `YYYY-MM-DD HH:MM:SS`, or `N/A` when absent. Values that do not parse
/// as a timestamp are shown as stored.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "N/A".into();
    };
    let out = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

    let formatted = match PrimitiveDateTime::parse(raw, naive) {
        Ok(dt) => dt.format(out).ok(),
        Err(_) => OffsetDateTime::parse(raw, &Rfc3339)
            .ok()
            .and_then(|dt| dt.format(out).ok()),
    };
    formatted.unwrap_or_else(|| raw.to_string())
}

pub fn user_card(user: &User) {
    println!("┌{}", "─".repeat(WIDTH - 2));
    println!("│ {} {} (ID: {})", role_icon(user.role), user.username, user.id);
    println!("├{}", "─".repeat(WIDTH - 2));
    println!("│ 📧 Email:    {}", user.email);
    println!("│ 👤 Name:     {}", user.full_name.as_deref().unwrap_or("N/A"));
    println!("│ 🎭 Role:     {}", role_label(user.role).to_uppercase());
    println!(
        "│ 🔘 Status:   {}",
        if user.active() { "Active" } else { "Inactive" }
    );
    println!("│ 📅 Created:  {}", format_date(user.created_at.as_deref()));
    println!("│ 🔄 Updated:  {}", format_date(user.updated_at.as_deref()));
    println!("└{}", "─".repeat(WIDTH - 2));
}

pub fn user_line(user: &User) {
    println!(
        "   • {} ({}) - {} - {}",
        user.username,
        user.email,
        role_label(user.role),
        format_date(user.created_at.as_deref())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_naive_timestamps() {
        assert_eq!(
            format_date(Some("2024-05-01T10:20:30")),
            "2024-05-01 10:20:30"
        );
    }

    #[test]
    fn formats_offset_timestamps() {
        assert_eq!(
            format_date(Some("2024-05-01T10:20:30Z")),
            "2024-05-01 10:20:30"
        );
    }

    #[test]
    fn missing_and_unparseable_dates() {
        assert_eq!(format_date(None), "N/A");
        assert_eq!(format_date(Some("yesterday")), "yesterday");
    }

    #[test]
    fn user_without_role_reads_as_na() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": 3, "username": "legacy", "email": "legacy@battlenet.com", "role": null
        }))
        .unwrap();
        assert_eq!(user.role, None);
        assert_eq!(role_label(user.role), "N/A");
        assert_eq!(role_label(Some(crate::users::Role::Moderator)), "moderator");
    }
}

use chrono::Local;

use crate::JobPosting;

/// Telegram "Markdown" (legacy) notification for one posting.
pub fn format_notification(posting: &JobPosting) -> String {
    let found = posting
        .found_at
        .with_timezone(&Local)
        .format("%d/%m/%Y %H:%M");
    format!(
        "🚨 *Nouvelle alternance cybersécurité*\n\n\
         📋 Poste : {title}\n\
         🏢 Entreprise : {company}\n\
         📍 Lieu : {location}\n\n\
         🔗 {url}\n\n\
         ⏰ Trouvée le {found}",
        title = escape_markdown(&posting.title),
        company = escape_markdown(&posting.company),
        location = escape_markdown(&posting.location),
        url = escape_markdown(&posting.url),
    )
}

/// Backslash-escapes the characters legacy Markdown treats as entity markers.
pub fn escape_markdown(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone, Utc};

    use super::*;

    #[test]
    fn template_embeds_every_field() {
        let found_at = Utc.with_ymd_and_hms(2025, 3, 4, 9, 30, 0).unwrap();
        let posting = JobPosting::new(
            "Alternant SOC",
            "ACME",
            "Lyon",
            "https://www.linkedin.com/jobs/view/1",
            found_at,
        );
        let text = format_notification(&posting);
        let expected_date = found_at.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string();

        assert!(text.contains("📋 Poste : Alternant SOC"));
        assert!(text.contains("🏢 Entreprise : ACME"));
        assert!(text.contains("📍 Lieu : Lyon"));
        assert!(text.contains("🔗 https://www.linkedin.com/jobs/view/1"));
        assert!(text.ends_with(&format!("⏰ Trouvée le {expected_date}")));
    }

    #[test]
    fn scraped_markup_characters_are_escaped() {
        assert_eq!(escape_markdown("C_level *SOC* [x] `y`"), "C\\_level \\*SOC\\* \\[x] \\`y\\`");
    }
}

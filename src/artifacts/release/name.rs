use chrono::{DateTime, Utc};

/// Name of the next release: `YYYYMMDD.1`, or the next revision of a same-day release
pub fn next_release_name(now: DateTime<Utc>, previous_tag: Option<&str>) -> anyhow::Result<String> {
    let current_date = now.format("%Y%m%d").to_string();

    let Some(previous_tag) = previous_tag.filter(|tag| tag.starts_with(&format!("{current_date}.")))
    else {
        return Ok(format!("{current_date}.1"));
    };

    let revision = previous_tag
        .split_once('.')
        .and_then(|(_, revision)| revision.parse::<u64>().ok())
        .ok_or_else(|| anyhow::anyhow!("malformed latest release tag name: {}", previous_tag))?;

    Ok(format!("{current_date}.{}", revision + 1))
}

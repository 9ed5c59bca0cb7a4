pub fn nightly_toolchain_from_commit_date(commit_date: &str) -> String {
    let date = commit_date
        .split_once('T')
        .map(|(date, _)| date)
        .unwrap_or(commit_date);
    format!("nightly-{}", date.trim())
}

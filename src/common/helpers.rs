use std::error::Error;

pub fn err_to_boxed_send_sync<T>(err: T) -> Box<dyn Error + Send + Sync>
where
    T: Into<Box<dyn Error + Send + Sync>>,
{
    err.into()
}

/// Truncates an event name so the derived role name stays readable.
pub fn reasonable_truncate(name: &str) -> &str {
    match name.char_indices().nth(50) {
        Some((index, _)) => &name[..index],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::reasonable_truncate;

    #[test]
    fn short_names_are_untouched() {
        assert_eq!(reasonable_truncate("Rust study group"), "Rust study group");
    }

    #[test]
    fn long_names_are_cut_at_fifty_chars() {
        let name = "a".repeat(80);
        assert_eq!(reasonable_truncate(&name).len(), 50);
    }
}

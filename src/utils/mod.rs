use std::{collections::HashMap, hash::Hash, sync::Once};

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber, writing to stderr so prompts stay clean.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bean_compose=warn"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Distinct items ordered by descending number of appearances.
///
/// Ties keep the order of first appearance.
pub fn ranked_set<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut order = Vec::new();
    for item in items {
        let count = counts.entry(item.clone()).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }
    // sort_by_key is stable, so equal counts keep first-seen order
    order.sort_by_key(|item| std::cmp::Reverse(counts[item]));
    order
}

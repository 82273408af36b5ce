use anyhow::{Context, Result, bail};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse seed tokens. Accepts plain integers and inclusive `start..end` ranges;
/// duplicates keep their first position.
pub fn parse_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    for token in tokens {
        let expanded: Vec<u64> = if let Some((start, end)) = token.split_once("..") {
            let start: u64 = start
                .parse()
                .with_context(|| format!("invalid range start in `{token}`"))?;
            let end: u64 = end
                .parse()
                .with_context(|| format!("invalid range end in `{token}`"))?;
            if start > end {
                bail!("seed range `{token}` is empty");
            }
            (start..=end).collect()
        } else {
            vec![token.parse().with_context(|| format!("invalid seed `{token}`"))?]
        };
        for seed in expanded {
            if !seeds.contains(&seed) {
                seeds.push(seed);
            }
        }
    }
    if seeds.is_empty() {
        bail!("no seeds given");
    }
    Ok(seeds)
}

use serde::{Deserialize, Serialize};

/// Result bucket chosen from the total match count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// No matches at all.
    Low,
    /// One to four matches.
    Mid,
    /// Five or more matches.
    High,
}

impl Tier {
    /// Tiers in the order the image prompts are shown.
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Mid, Tier::High];

    /// Open-dialog label used when picking this tier's image.
    pub fn prompt(self) -> &'static str {
        match self {
            Tier::Low => "Select an image for \"No Matches\" case",
            Tier::Mid => "Select an image for \"Less than Five Matches\" case",
            Tier::High => "Select an image for \"Five or More Matches\" case",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Low => "low",
            Tier::Mid => "mid",
            Tier::High => "high",
        };
        f.write_str(name)
    }
}

pub fn select_tier(total: usize) -> Tier {
    if total == 0 {
        Tier::Low
    } else if total < 5 {
        Tier::Mid
    } else {
        Tier::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_low() {
        assert_eq!(select_tier(0), Tier::Low);
    }

    #[test]
    fn one_through_four_is_mid() {
        for n in 1..=4 {
            assert_eq!(select_tier(n), Tier::Mid, "total {n}");
        }
    }

    #[test]
    fn five_and_above_is_high() {
        for n in [5, 6, 42, usize::MAX] {
            assert_eq!(select_tier(n), Tier::High, "total {n}");
        }
    }

    #[test]
    fn prompts_follow_tier_order() {
        let prompts: Vec<_> = Tier::ALL.iter().map(|t| t.prompt()).collect();
        assert!(prompts[0].contains("No Matches"));
        assert!(prompts[1].contains("Less than Five"));
        assert!(prompts[2].contains("Five or More"));
    }
}

//! Motivational messages shown on sustained drowsiness

use rand::seq::SliceRandom;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

pub const QUOTES: &[Quote] = &[
    Quote { text: "Stay alert, stay alive!", author: "Safety First" },
    Quote { text: "Your safety is worth staying awake for.", author: "Safety Proverb" },
    Quote { text: "Take a break if you need to, but stay focused!", author: "Wellness Expert" },
    Quote { text: "A moment of drowsiness can lead to a lifetime of regret.", author: "Safety Slogan" },
    Quote { text: "Your journey is important - stay awake to complete it safely.", author: "Travel Safety" },
    Quote { text: "Alert mind, safe journey!", author: "Road Safety" },
    Quote { text: "Don't let fatigue take the wheel.", author: "Driving Safety" },
    Quote { text: "Your alertness is your best protection.", author: "Safety Mantra" },
    Quote { text: "Stay sharp, stay safe!", author: "Safety First" },
    Quote { text: "A clear mind leads to a safe journey.", author: "Wellness Expert" },
    Quote { text: "Your focus is your power - stay awake!", author: "Motivational Quote" },
    Quote { text: "Safety never takes a nap.", author: "Safety Proverb" },
    Quote { text: "Stay awake, stay aware, stay alive!", author: "Safety Slogan" },
    Quote { text: "Your alertness is your responsibility.", author: "Safety First" },
    Quote { text: "Don't let fatigue be your last decision.", author: "Safety Warning" },
];

/// Pick a quote at random
pub fn random_quote() -> Quote {
    QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(QUOTES[0])
}

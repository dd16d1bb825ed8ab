use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

const AFFIRMATIONS: [&str; 15] = [
    "You are stronger than you think.",
    "Today is full of possibilities.",
    "Your mental health matters.",
    "You deserve happiness and peace.",
    "Progress, not perfection.",
    "You are doing the best you can.",
    "Be kind to yourself today.",
    "Your feelings are valid.",
    "You have the power to change.",
    "This moment does not define you.",
    "You are worthy just as you are.",
    "Your potential is limitless.",
    "Every small step counts.",
    "You are braver than you believe.",
    "Your story matters.",
];

const DAILY_AFFIRMATIONS: [&str; 6] = [
    "I am enough, just as I am.",
    "I can handle this, one step at a time.",
    "My feelings are valid, and they will pass.",
    "I choose kindness toward myself today.",
    "I am learning, growing, and healing.",
    "I can create moments of calm in my day.",
];

const TIPS: [&str; 15] = [
    "Take 5 deep breaths to calm your mind and body.",
    "Go for a 10-minute walk to boost your mood.",
    "Drink a glass of water - hydration affects mood!",
    "Practice gratitude by listing 3 things you're thankful for.",
    "Limit social media to protect your mental health.",
    "Get 7-9 hours of sleep for better emotional balance.",
    "Eat a healthy meal to nourish your body and mind.",
    "Call a friend or family member you care about.",
    "Stretch for 5 minutes to release tension.",
    "Practice saying 'no' to protect your time and energy.",
    "Spend time in nature - it's therapeutic!",
    "Journal your thoughts without judgment.",
    "Meditate for even just 1 minute.",
    "Laugh - watch a funny video or recall a happy memory.",
    "Help someone today - kindness boosts your mood too!",
];

pub fn random_affirmation<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    AFFIRMATIONS.choose(rng).copied().unwrap_or(AFFIRMATIONS[0])
}

/// Same affirmation all day, rotating by day of year.
pub fn daily_affirmation(today: NaiveDate) -> &'static str {
    DAILY_AFFIRMATIONS[today.ordinal() as usize % DAILY_AFFIRMATIONS.len()]
}

pub fn wellness_tip<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    TIPS.choose(rng).copied().unwrap_or(TIPS[0])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidedExercise {
    Breathing,
    Grounding,
    Affirmation,
}

impl GuidedExercise {
    pub const ALL: [GuidedExercise; 3] = [
        GuidedExercise::Breathing,
        GuidedExercise::Grounding,
        GuidedExercise::Affirmation,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            GuidedExercise::Breathing => "Breathing 4-7-8",
            GuidedExercise::Grounding => "5-4-3-2-1 Grounding",
            GuidedExercise::Affirmation => "Daily Affirmation",
        }
    }

    /// Label stored in the entry's `exercise` field.
    pub fn label(&self) -> &'static str {
        match self {
            GuidedExercise::Breathing => "Breathing",
            GuidedExercise::Grounding => "Grounding",
            GuidedExercise::Affirmation => "Affirmation",
        }
    }

    pub fn guidance(&self, today: NaiveDate) -> String {
        match self {
            GuidedExercise::Breathing => {
                "Practice: Inhale 4s, hold 7s, exhale 8s. Repeat 2-4 cycles. Stop if dizzy."
                    .to_string()
            }
            GuidedExercise::Grounding => "Grounding: Identify 5 things you see, 4 you can touch, \
                 3 you can hear, 2 you can smell, 1 you can taste."
                .to_string(),
            GuidedExercise::Affirmation => {
                format!("Affirmation: \"{}\"", daily_affirmation(today))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WorkoutStep {
    pub name: &'static str,
    pub duration: &'static str,
    pub instructions: &'static str,
}

pub const QUICK_WORKOUT: [WorkoutStep; 4] = [
    WorkoutStep {
        name: "Neck Rolls",
        duration: "30 seconds",
        instructions: "Slowly roll your neck in circles. Do 5-10 circles each direction. Breathe deeply.",
    },
    WorkoutStep {
        name: "Shoulder Shrugs",
        duration: "30 seconds",
        instructions: "Lift shoulders to ears. Hold for 2 seconds. Release. Repeat 15 times.",
    },
    WorkoutStep {
        name: "Wrist Stretches",
        duration: "30 seconds",
        instructions: "Extend arms forward. Gently pull back fingers. Hold 15 seconds each hand.",
    },
    WorkoutStep {
        name: "Standing Stretch",
        duration: "1 minute",
        instructions: "Reach arms overhead. Bend gently to each side. Hold 15 seconds each.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn daily_affirmation_is_stable_within_a_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(daily_affirmation(day), daily_affirmation(day));
        let next = day.succ_opt().unwrap();
        assert_ne!(daily_affirmation(day), daily_affirmation(next));
    }

    #[test]
    fn random_picks_come_from_their_lists() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(AFFIRMATIONS.contains(&random_affirmation(&mut rng)));
        assert!(TIPS.contains(&wellness_tip(&mut rng)));
    }

    #[test]
    fn affirmation_exercise_uses_daily_affirmation() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let text = GuidedExercise::Affirmation.guidance(day);
        assert!(text.contains(daily_affirmation(day)));
        assert_eq!(GuidedExercise::Grounding.label(), "Grounding");
    }
}

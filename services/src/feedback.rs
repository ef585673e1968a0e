//! Feedback message selection.
//!
//! The cascade is data: an ordered slice of (predicate, renderer) pairs
//! evaluated top to bottom, first match wins, exactly one message per
//! evaluation. Adding a rule means adding an element, not another branch.
//! Messages exist in Russian and Kazakh; the default success bucket picks
//! one of several equivalent variants at random.

use crate::checkin::Outcome;
use crate::history::AttendanceStats;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Absence of this many days or more selects the long-absence message.
pub const LONG_ABSENCE_DAYS: i64 = 45;
/// Absence of this many days or more (below the long threshold) selects the
/// medium-absence message.
pub const MEDIUM_ABSENCE_DAYS: i64 = 7;
/// Monthly visits at or above this count select the high-engagement message.
pub const HIGH_PRESENCE_COUNT: u32 = 20;
/// Streak length at or above this count selects the streak-praise message.
pub const PRAISE_STREAK_DAYS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    Kk,
}

impl Locale {
    /// Parses a language tag, falling back to Russian for anything unknown.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "kk" => Locale::Kk,
            _ => Locale::Ru,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RuleInput {
    outcome: Outcome,
    stats: AttendanceStats,
}

struct Rule {
    applies: fn(&RuleInput) -> bool,
    render: fn(&RuleInput, Locale) -> String,
}

/// Priority order. The outcome-specific buckets rank above the absence rules
/// so a failed attempt can never draw an absence or praise message; the final
/// rule is a catch-all.
const RULES: &[Rule] = &[
    Rule {
        applies: |i| i.outcome == Outcome::Suspicious,
        render: |_, locale| suspicious(locale),
    },
    Rule {
        applies: |i| i.outcome == Outcome::DeviceRejected,
        render: |_, locale| device_rejected(locale),
    },
    Rule {
        applies: |i| i.outcome == Outcome::OutOfRange,
        render: |_, locale| out_of_range(locale),
    },
    Rule {
        applies: |i| i.outcome == Outcome::Duplicate,
        render: |_, locale| duplicate(locale),
    },
    Rule {
        applies: |i| i.stats.days_since_last.is_some_and(|d| d >= LONG_ABSENCE_DAYS),
        render: |i, locale| long_absence(i.stats.days_since_last.unwrap_or(0), locale),
    },
    Rule {
        applies: |i| i.stats.days_since_last.is_some_and(|d| d >= MEDIUM_ABSENCE_DAYS),
        render: |i, locale| medium_absence(i.stats.days_since_last.unwrap_or(0), locale),
    },
    Rule {
        applies: |i| {
            i.stats.rolling_presence >= HIGH_PRESENCE_COUNT && i.outcome == Outcome::SuccessOnTime
        },
        render: |i, locale| high_engagement(i.stats.rolling_presence, locale),
    },
    Rule {
        applies: |i| i.stats.streak >= PRAISE_STREAK_DAYS && i.outcome == Outcome::SuccessOnTime,
        render: |i, locale| streak_praise(i.stats.streak, locale),
    },
    Rule {
        applies: |i| i.outcome == Outcome::SuccessLate,
        render: |_, locale| late(locale),
    },
    Rule {
        applies: |_| true,
        render: |_, locale| default_success(locale),
    },
];

/// Picks the message for one check-in evaluation.
pub fn select_message(outcome: Outcome, stats: &AttendanceStats, locale: Locale) -> String {
    let input = RuleInput {
        outcome,
        stats: *stats,
    };

    for rule in RULES {
        if (rule.applies)(&input) {
            return (rule.render)(&input, locale);
        }
    }
    default_success(locale)
}

fn suspicious(locale: Locale) -> String {
    match locale {
        Locale::Ru => {
            "Система считает эту отметку подозрительной. Если это ошибка — подойди к куратору 👀"
        }
        Locale::Kk => {
            "Жүйе бұл белгілеуді күдікті деп санайды. Қате болса, кураторға хабарлас 👀"
        }
    }
    .to_string()
}

fn device_rejected(locale: Locale) -> String {
    match locale {
        Locale::Ru => "Это не привязанное устройство. Обратитесь к куратору.",
        Locale::Kk => "Бұл тіркелген құрылғы емес. Топ жетекшісіне жүгініңіз.",
    }
    .to_string()
}

fn out_of_range(locale: Locale) -> String {
    match locale {
        Locale::Ru => {
            "Вы находитесь вне территории колледжа. Отметиться можно только на территории учебного корпуса."
        }
        Locale::Kk => {
            "Сіз колледж аумағынан тыссыз. Қатысуды тек оқу корпусы аумағында белгілеуге болады."
        }
    }
    .to_string()
}

fn duplicate(locale: Locale) -> String {
    match locale {
        Locale::Ru => "Ты уже отметился сегодня ✅",
        Locale::Kk => "Сен бүгін белгіленіп қойдың ✅",
    }
    .to_string()
}

fn long_absence(days: i64, locale: Locale) -> String {
    match locale {
        Locale::Ru => format!(
            "Кавоооооо тебя не было {days} дней, больше так не делай пожааалуйста! 😱"
        ),
        Locale::Kk => format!("{days} күн болмадың, енді былай жасамашы! 😱"),
    }
}

fn medium_absence(days: i64, locale: Locale) -> String {
    match locale {
        Locale::Ru => format!(
            "Ты пропал на {days} дней. Хорошо, что вернулся, так больше не пропадай 🥺"
        ),
        Locale::Kk => format!("Сен {days} күн болмадың. Қайтып келгенің жақсы, енді жоғалмашы 🥺"),
    }
}

fn high_engagement(visits: u32, locale: Locale) -> String {
    match locale {
        Locale::Ru => format!("Красавчик! Уже {visits} посещений за месяц, дисциплина на высоте 💪"),
        Locale::Kk => format!("Жарайсың! Бір айда {visits} рет келдің, тәртіп жоғары деңгейде 💪"),
    }
}

fn streak_praise(days: u32, locale: Locale) -> String {
    match locale {
        Locale::Ru => format!("Ты уже {days} дней подряд без прогулов. Вот это настрой! 🔥"),
        Locale::Kk => format!("Сен қатарынан {days} күн қалмай келесің. Осылай жалғастыр! 🔥"),
    }
}

fn late(locale: Locale) -> String {
    match locale {
        Locale::Ru => "Сегодня ты немного опоздал(а). В следующий раз постарайся прийти вовремя 😉",
        Locale::Kk => "Бүгін сәл кешігіп келдің. Келесі жолы уақытында келуге тырыс 😉",
    }
    .to_string()
}

const DEFAULT_RU: &[&str] = &[
    "Отличная работа! Ты сегодня отметился, так держать! ✅",
    "Молодец! Каждый день — новый шанс.",
    "Здорово, что ты пришёл! Шаг к знаниям никогда не бывает лишним.",
    "Верь в себя — именно сейчас ты строишь своё будущее.",
];

const DEFAULT_KK: &[&str] = &[
    "Тамаша бастама! Бүгінгі күніңіз сәтті өтсін!",
    "Жарайсың! Әр күн — жаңа мүмкіндік.",
    "Келгенің өте жақсы! Білімге жасаған қадамың зая кетпейді.",
    "Өзіңе сен! Қазірден бастап болашағыңды құрып жатырсың.",
];

fn default_success(locale: Locale) -> String {
    let variants = match locale {
        Locale::Ru => DEFAULT_RU,
        Locale::Kk => DEFAULT_KK,
    };
    variants
        .choose(&mut rand::thread_rng())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

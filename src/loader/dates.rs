//! Stratégies de résolution de la colonne date, essayées dans l'ordre.

use super::util::{before_comma, slash_parts};
use crate::model::Cell;
use chrono::{Datelike, NaiveDate};

/// Contexte fourni à chaque stratégie pour une ligne.
#[derive(Debug, Clone, Copy)]
pub struct DateContext {
    /// Année de la ligne, ou année par défaut
    pub year: i32,
    /// Mois lu dans la colonne mois, si présente
    pub month_hint: Option<u32>,
    /// Date système (injectée pour les tests)
    pub today: NaiveDate,
}

pub trait DateStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_parse(&self, raw: &Cell, ctx: &DateContext) -> Option<NaiveDate>;

    /// La date produite porte sa propre année (sert à inférer l'année par défaut).
    fn carries_year(&self) -> bool {
        false
    }

    /// La résolution a dû deviner une partie de la date.
    fn is_guess(&self, _ctx: &DateContext) -> bool {
        false
    }
}

/// 1. Date native.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDate;

impl DateStrategy for NativeDate {
    fn name(&self) -> &'static str {
        "native_date"
    }

    fn try_parse(&self, raw: &Cell, _ctx: &DateContext) -> Option<NaiveDate> {
        match raw {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    fn carries_year(&self) -> bool {
        true
    }
}

/// 2. `jour/mois` suivi d'un suffixe après virgule (`"18/12, Thu"`), ou seul (`"18/12"`).
#[derive(Debug, Default, Clone, Copy)]
pub struct DayMonthWithSuffix;

impl DateStrategy for DayMonthWithSuffix {
    fn name(&self) -> &'static str {
        "day_month"
    }

    fn try_parse(&self, raw: &Cell, ctx: &DateContext) -> Option<NaiveDate> {
        let Cell::Text(t) = raw else { return None };
        if !t.contains('/') {
            return None;
        }
        let head = before_comma(t);
        if !t.contains(',') && head.matches('/').count() != 1 {
            return None;
        }
        match slash_parts(head)?.as_slice() {
            [day, month] => NaiveDate::from_ymd_opt(ctx.year, *month, *day),
            _ => None,
        }
    }
}

/// 3. `jour/mois/année` complet (`"05/01/2024"`).
#[derive(Debug, Default, Clone, Copy)]
pub struct FullDayMonthYear;

impl DateStrategy for FullDayMonthYear {
    fn name(&self) -> &'static str {
        "day_month_year"
    }

    fn try_parse(&self, raw: &Cell, _ctx: &DateContext) -> Option<NaiveDate> {
        let Cell::Text(t) = raw else { return None };
        let head = before_comma(t);
        if head.matches('/').count() != 2 {
            return None;
        }
        let year_part = head.rsplit('/').next()?.trim();
        if year_part.len() != 4 {
            return None;
        }
        match slash_parts(head)?.as_slice() {
            [day, month, year] => {
                NaiveDate::from_ymd_opt(i32::try_from(*year).ok()?, *month, *day)
            }
            _ => None,
        }
    }

    fn carries_year(&self) -> bool {
        true
    }
}

/// 4. Jour du mois seul ; le mois vient de la colonne mois, sinon du mois
/// système courant (peu fiable, signalé par `is_guess`).
#[derive(Debug, Clone, Copy)]
pub struct DayOfMonthFallback {
    pub guess_month: bool,
}

impl DayOfMonthFallback {
    fn day(raw: &Cell) -> Option<u32> {
        match raw {
            Cell::Number(n) if n.fract() == 0.0 && *n >= 1.0 && *n <= 31.0 => Some(*n as u32),
            Cell::Text(t) if !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()) => {
                t.parse().ok()
            }
            _ => None,
        }
    }
}

impl DateStrategy for DayOfMonthFallback {
    fn name(&self) -> &'static str {
        "day_of_month"
    }

    fn try_parse(&self, raw: &Cell, ctx: &DateContext) -> Option<NaiveDate> {
        let day = Self::day(raw)?;
        let month = match ctx.month_hint {
            Some(m) => m,
            None if self.guess_month => ctx.today.month(),
            None => return None,
        };
        NaiveDate::from_ymd_opt(ctx.year, month, day)
    }

    fn is_guess(&self, ctx: &DateContext) -> bool {
        ctx.month_hint.is_none()
    }
}

/// Chaîne ordonnée par défaut.
pub fn default_strategies(guess_month: bool) -> Vec<Box<dyn DateStrategy>> {
    vec![
        Box::new(NativeDate),
        Box::new(DayMonthWithSuffix),
        Box::new(FullDayMonthYear),
        Box::new(DayOfMonthFallback { guess_month }),
    ]
}

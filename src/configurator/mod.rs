//! Live option panel interaction.
//!
//! | Module      | Responsibility                                      |
//! |-------------|-----------------------------------------------------|
//! | `patterns`  | Row text classification (summaries, chrome, values) |
//! | `navigator` | Scroll passes, view transitions, back-out           |
//! | `scanner`   | Option tree enumeration                             |
//! | `applier`   | Clicking one selection into the panel               |

mod applier;
mod navigator;
mod patterns;
mod scanner;

pub(crate) use applier::SelectionApplier;
pub(crate) use scanner::OptionScanner;

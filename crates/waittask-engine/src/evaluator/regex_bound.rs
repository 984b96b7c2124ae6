use waittask_types::{ErrorKind, WaitTaskError};

/// Cheap, conservative estimate of how many NFA states a pattern compiles to,
/// used to reject patterns prone to catastrophic backtracking before they
/// ever reach the `regex` crate (which is linear-time itself, but a huge
/// alternation/repetition count can still make a single match expensive).
///
/// This is not a real NFA construction — it is a character-class scan that
/// counts quantifiers (`*`, `+`, `?`, `{m,n}`) and weights *nested*
/// quantifiers (a quantifier applying to a group that itself contains a
/// quantifier, e.g. `(a+)+`) far higher than *sibling* quantifiers
/// (`a+b+`), since nesting is the actual shape that blows up backtracking
/// engines. A handful of sibling-quantifier terms stays cheap; one level of
/// nesting is penalized exponentially in the nesting count.
pub fn estimate_states(pattern: &str) -> u32 {
    let chars: Vec<char> = pattern.chars().collect();
    let mut base_states: u32 = 1;
    let mut depth_quantified: Vec<bool> = Vec::new();
    let mut nested_hits: u32 = 0;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 1;
                base_states = base_states.saturating_add(1);
            }
            '(' => {
                depth_quantified.push(false);
                i += 1;
            }
            ')' => {
                let had_quantifier_inside = depth_quantified.pop().unwrap_or(false);
                i += 1;
                if i < chars.len() && is_quantifier_start(chars[i]) {
                    if had_quantifier_inside {
                        nested_hits += 1;
                    }
                    if let Some(parent) = depth_quantified.last_mut() {
                        *parent = true;
                    }
                    i += skip_quantifier(&chars, i);
                }
            }
            c if is_quantifier_start(c) => {
                if let Some(parent) = depth_quantified.last_mut() {
                    *parent = true;
                }
                base_states = base_states.saturating_add(2);
                i += skip_quantifier(&chars, i);
            }
            '|' => {
                base_states = base_states.saturating_add(1);
                i += 1;
            }
            _ => {
                base_states = base_states.saturating_add(1);
                i += 1;
            }
        }
    }

    if nested_hits == 0 {
        base_states
    } else {
        let exponent = nested_hits.min(4);
        base_states.saturating_mul(100u32.saturating_pow(exponent))
    }
}

fn is_quantifier_start(c: char) -> bool {
    matches!(c, '*' | '+' | '?' | '{')
}

fn skip_quantifier(chars: &[char], at: usize) -> usize {
    match chars[at] {
        '*' | '+' | '?' => 1,
        '{' => {
            let mut j = at + 1;
            while j < chars.len() && chars[j] != '}' {
                j += 1;
            }
            j.saturating_sub(at) + 1
        }
        _ => 1,
    }
}

/// Reject `pattern` if its estimated NFA state count exceeds `limit`.
pub fn check_bound(pattern: &str, limit: u32) -> Result<(), WaitTaskError> {
    let estimated = estimate_states(pattern);
    if estimated > limit {
        Err(WaitTaskError::new(
            ErrorKind::InvalidConfig,
            format!(
                "regex pattern '{pattern}' estimated at {estimated} NFA states exceeds the bound of {limit}"
            ),
        ))
    } else {
        Ok(())
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Natural ordering: runs of ASCII digits compare by numeric value, so
/// "Race 9" sorts before "Race 10". Ties on value fall back to the run with
/// fewer leading zeros.
pub fn natural_cmp(left: &str, right: &str, case_sensitive: bool) -> Ordering {
    let mut left = left.chars().peekable();
    let mut right = right.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ordering = compare_digit_runs(&take_digits(&mut left), &take_digits(&mut right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = if case_sensitive {
                    l.cmp(&r)
                } else {
                    fold(l).cmp(&fold(r))
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

pub fn natural_cmp_ignore_case(left: &str, right: &str) -> Ordering {
    natural_cmp(left, right, false)
}

fn fold(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(ch) = chars.next_if(char::is_ascii_digit) {
        run.push(ch);
    }
    run
}

fn compare_digit_runs(left: &str, right: &str) -> Ordering {
    let left_value = left.trim_start_matches('0');
    let right_value = right.trim_start_matches('0');
    left_value
        .len()
        .cmp(&right_value.len())
        .then_with(|| left_value.cmp(right_value))
        .then_with(|| left.len().cmp(&right.len()))
}

// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned reply templates.
//!
//! Replies are bilingual (Swahili first, short English hint where it helps).
//! Every validation failure names the input expected next.

use mchango_core::types::{Group, Role};

pub fn welcome_role_prompt() -> String {
    "Karibu Mchango! 👋\n\
     Tafadhali chagua nafasi yako:\n\
     1. Kiongozi\n\
     2. Mwanachama"
        .to_string()
}

pub fn role_invalid() -> String {
    "Samahani, sikuelewa. Jibu kwa:\n\
     1 (au \"kiongozi\") — Kiongozi\n\
     2 (au \"mwanachama\") — Mwanachama"
        .to_string()
}

pub fn name_prompt(role: Role) -> String {
    let role_name = match role {
        Role::Leader => "Kiongozi",
        Role::Member => "Mwanachama",
    };
    format!("Vizuri, umechagua {role_name}. Sasa andika jina lako kamili.")
}

pub fn name_too_short() -> String {
    "Jina ni fupi mno. Tafadhali andika jina lenye angalau herufi mbili.".to_string()
}

pub fn registration_complete(name: &str) -> String {
    format!("Asante {name}, usajili umekamilika! ✅\n\n{}", main_menu())
}

pub fn main_menu() -> String {
    "Menyu kuu — jibu kwa neno moja:\n\
     • toa <kiasi> — kutoa mchango\n\
     • salio — kuona salio lako\n\
     • taarifa — taarifa za kikundi\n\
     • fungua — kufungua kikundi kipya (kiongozi)\n\
     • jiunge — kujiunge na kikundi\n\
     • msaada — maelezo zaidi"
        .to_string()
}

pub fn contribution_prompt(min: u64, max: u64) -> String {
    format!(
        "Andika kiasi cha mchango wako kwa TZS (kati ya {} na {}).",
        format_amount(min),
        format_amount(max)
    )
}

pub fn invalid_amount(min: u64, max: u64) -> String {
    format!(
        "Kiasi si sahihi. Tafadhali andika namba kati ya TZS {} na {}.",
        format_amount(min),
        format_amount(max)
    )
}

pub fn contribution_confirmed(amount: u64) -> String {
    format!(
        "Mchango wa TZS {} umepokelewa. Asante! ✅",
        format_amount(amount)
    )
}

pub fn group_name_prompt() -> String {
    "Andika jina la kikundi kipya (angalau herufi tatu).".to_string()
}

pub fn group_name_invalid() -> String {
    "Jina la kikundi ni fupi mno. Andika jina lenye angalau herufi tatu.".to_string()
}

pub fn group_amount_prompt(min: u64, max: u64) -> String {
    format!(
        "Kiasi cha mchango kwa kila mwanachama kitakuwa shilingi ngapi? (TZS {} - {})",
        format_amount(min),
        format_amount(max)
    )
}

pub fn member_count_prompt(min: u32, max: u32) -> String {
    format!("Kikundi kitakuwa na wanachama wangapi? ({min} - {max})")
}

pub fn member_count_invalid(min: u32, max: u32) -> String {
    format!("Idadi si sahihi. Andika namba kati ya {min} na {max}.")
}

pub fn group_created(group: &Group) -> String {
    format!(
        "Kikundi \"{}\" kimefunguliwa! 🎉\n\
         Msimbo wa kujiunga: {}\n\
         Mchango: TZS {} kwa kila mwanachama, wanachama {} wa juu.\n\
         Washirikishe wanachama msimbo huu.",
        group.name,
        group.code,
        format_amount(group.contribution_amount),
        group.max_members
    )
}

pub fn join_code_prompt() -> String {
    "Andika msimbo wa kikundi unachotaka kujiunga nacho (mfano: CHAMA001).".to_string()
}

pub fn join_code_invalid() -> String {
    "Msimbo si sahihi. Msimbo una herufi na namba pekee, mfano CHAMA001.".to_string()
}

pub fn group_not_found(code: &str) -> String {
    format!("Hakuna kikundi chenye msimbo {code}. Hakiki msimbo na ujaribu tena.")
}

pub fn group_joined(group: &Group) -> String {
    format!(
        "Umejiunga na \"{}\"! Mchango wa kikundi ni TZS {}.",
        group.name,
        format_amount(group.contribution_amount)
    )
}

pub fn balance(groups: &[Group]) -> String {
    if groups.is_empty() {
        return "Bado haujajiunga na kikundi chochote. Andika \"jiunge\" kuanza.".to_string();
    }
    let mut out = String::from("Salio lako:\n");
    for g in groups {
        out.push_str(&format!(
            "• {} — mchango TZS {}\n",
            g.name,
            format_amount(g.contribution_amount)
        ));
    }
    out
}

pub fn status(groups: &[Group]) -> String {
    if groups.is_empty() {
        return "Hakuna taarifa: haujajiunga na kikundi chochote bado.".to_string();
    }
    let mut out = String::from("Taarifa za vikundi vyako:\n");
    for g in groups {
        out.push_str(&format!(
            "• {} ({}): wanachama {} wa juu, mchango TZS {}\n",
            g.name,
            g.code,
            g.max_members,
            format_amount(g.contribution_amount)
        ));
    }
    out
}

pub fn help_text() -> String {
    format!(
        "Mchango ni huduma ya vikundi vya akiba (chama) kupitia WhatsApp.\n\n{}",
        main_menu()
    )
}

pub fn apology() -> String {
    "Samahani, kuna hitilafu ya kiufundi. Tafadhali jaribu tena baadaye.".to_string()
}

/// Formats an amount with comma grouping, e.g. `50000` -> `"50,000"`.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_amount_groups_thousands() {
        assert_eq!(format_amount(500), "500");
        assert_eq!(format_amount(50_000), "50,000");
        assert_eq!(format_amount(1_000_000), "1,000,000");
    }

    #[test]
    fn invalid_amount_names_the_bounds() {
        let msg = invalid_amount(10_000, 1_000_000);
        assert!(msg.contains("10,000"));
        assert!(msg.contains("1,000,000"));
    }

    #[test]
    fn balance_lists_each_group() {
        let groups = vec![
            Group {
                code: "CHAMA001".into(),
                name: "Umoja".into(),
                contribution_amount: 50_000,
                max_members: 10,
            },
            Group {
                code: "CHAMA002".into(),
                name: "Tumaini".into(),
                contribution_amount: 20_000,
                max_members: 5,
            },
        ];
        let msg = balance(&groups);
        assert!(msg.contains("Umoja"));
        assert!(msg.contains("Tumaini"));
    }
}

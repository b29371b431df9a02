//! Verdict Types
//!
//! Maps predictor class codes to traffic categories.
//! No logic beyond the fixed code table.

use serde::Serialize;

// ============================================================================
// ATTACK CATEGORY
// ============================================================================

/// Traffic category the model was trained to recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackCategory {
    Benign,
    ArpSpoofing,
    Ddos,
    Dos,
    Mqtt,
    Recon,
}

impl AttackCategory {
    /// Map a predictor class code. Codes outside 1..=5 are benign.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => AttackCategory::ArpSpoofing,
            2 => AttackCategory::Ddos,
            3 => AttackCategory::Dos,
            4 => AttackCategory::Mqtt,
            5 => AttackCategory::Recon,
            _ => AttackCategory::Benign,
        }
    }

    /// User-facing result text
    pub fn label(&self) -> &'static str {
        match self {
            AttackCategory::Benign => "Traffic is benign ✅",
            AttackCategory::ArpSpoofing => "Cyber-Attack: ARP Spoofing ❌",
            AttackCategory::Ddos => "Cyber-Attack: DDoS ❌",
            AttackCategory::Dos => "Cyber-Attack: DoS ❌",
            AttackCategory::Mqtt => "Cyber-Attack: MQTT Attack ❌",
            AttackCategory::Recon => "Cyber-Attack: Recon ❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttackCategory::Benign => "benign",
            AttackCategory::ArpSpoofing => "arp_spoofing",
            AttackCategory::Ddos => "ddos",
            AttackCategory::Dos => "dos",
            AttackCategory::Mqtt => "mqtt",
            AttackCategory::Recon => "recon",
        }
    }

    pub fn is_attack(&self) -> bool {
        !matches!(self, AttackCategory::Benign)
    }
}

impl std::fmt::Display for AttackCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// Outcome of one classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub category: AttackCategory,
    /// Raw class code returned by the predictor
    pub code: i64,
    pub label: &'static str,
    pub is_attack: bool,
}

impl Verdict {
    pub fn from_code(code: i64) -> Self {
        let category = AttackCategory::from_code(code);
        Self {
            category,
            code,
            label: category.label(),
            is_attack: category.is_attack(),
        }
    }
}

//! Token accounting for the questions an agent has answered.

use chatdb_ai::TokenUsage;

/// What `/usage` reports: running totals plus the cost of the latest question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageReport {
    pub questions: u64,
    pub model_calls: u64,
    pub total: TokenUsage,
    pub last_question: TokenUsage,
}

impl UsageReport {
    /// Mean tokens spent per answered question.
    pub fn tokens_per_question(&self) -> u64 {
        self.total
            .total_tokens()
            .checked_div(self.questions)
            .unwrap_or(0)
    }
}

/// Accumulates usage; a question opens a fresh `last_question` bucket.
#[derive(Debug, Default)]
pub(crate) struct UsageLedger {
    report: UsageReport,
}

impl UsageLedger {
    pub(crate) fn begin_question(&mut self) {
        self.report.questions += 1;
        self.report.last_question = TokenUsage::default();
    }

    pub(crate) fn record(&mut self, usage: &TokenUsage) {
        let r = &mut self.report;
        r.model_calls += 1;
        for bucket in [&mut r.total, &mut r.last_question] {
            bucket.input_tokens = bucket.input_tokens.saturating_add(usage.input_tokens);
            bucket.output_tokens = bucket.output_tokens.saturating_add(usage.output_tokens);
        }
    }

    pub(crate) fn report(&self) -> UsageReport {
        self.report
    }
}

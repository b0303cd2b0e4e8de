use crate::{
    aggregate::{
        self, AggregateVerb, GroupAggregate, GroupKey, OutcomeCrosstab, OutcomeSummary,
        StaySummary,
    },
    chart::{self, ChartSpec},
    clean::{CleaningReport, clean_with_report},
    error::AnalysisError,
    filter::RowFilter,
    records::{PatientTable, RawTable},
    timeseries::{self, Frequency, PeriodCount},
};

/// One loaded dataset. The cleaned table is the only state and is never
/// mutated after construction; filtering yields a new analyzer.
#[derive(Debug, Clone)]
pub struct HealthAnalyzer {
    table: PatientTable,
    report: CleaningReport,
}

impl HealthAnalyzer {
    pub fn new(raw: &RawTable) -> Self {
        let (table, report) = clean_with_report(raw);
        Self { table, report }
    }

    pub fn table(&self) -> &PatientTable {
        &self.table
    }

    pub fn cleaning_report(&self) -> &CleaningReport {
        &self.report
    }

    pub fn filtered(&self, filter: &RowFilter) -> HealthAnalyzer {
        HealthAnalyzer {
            table: filter.apply(&self.table),
            report: self.report.clone(),
        }
    }

    pub fn summarize_outcomes(&self) -> Result<OutcomeSummary, AnalysisError> {
        aggregate::summarize_outcomes(&self.table)
    }

    pub fn summarize_outcomes_by(&self, key: GroupKey) -> Result<OutcomeCrosstab, AnalysisError> {
        aggregate::summarize_outcomes_by(&self.table, key)
    }

    pub fn aggregate_by(
        &self,
        key: GroupKey,
        verb: AggregateVerb,
        value_column: Option<&str>,
    ) -> Result<Vec<GroupAggregate>, AnalysisError> {
        aggregate::aggregate_by(&self.table, key, verb, value_column)
    }

    pub fn admissions_over_time(
        &self,
        frequency: Frequency,
    ) -> Result<Vec<PeriodCount>, AnalysisError> {
        timeseries::admissions_over_time(&self.table, frequency)
    }

    pub fn average_satisfaction_by_department(&self) -> Vec<GroupAggregate> {
        aggregate::average_satisfaction_by_department(&self.table)
    }

    pub fn length_of_stay_summary(&self) -> Result<StaySummary, AnalysisError> {
        aggregate::length_of_stay_summary(&self.table)
    }

    pub fn outcomes_by_age_chart(&self, bin_width: f64) -> Result<Option<ChartSpec>, AnalysisError> {
        chart::outcomes_by_age(&self.table, bin_width)
    }

    pub fn admissions_chart(&self, frequency: Frequency) -> Option<ChartSpec> {
        chart::admissions(&self.table, frequency)
    }

    pub fn satisfaction_chart(&self) -> Option<ChartSpec> {
        chart::satisfaction_by_department(&self.table)
    }
}

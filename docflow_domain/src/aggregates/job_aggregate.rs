// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Reconciliation
//!
//! Pure fold logic behind the lifecycle scheduler (C11, §4.11): given a
//! job's children, decide whether there is still work pending or the job
//! should be folded into a terminal outcome. Kept free of any I/O so the
//! scheduler's repository layer can be tested against this logic directly.

use crate::entities::file::FileProcessingStatus;
use crate::entities::gx::GxStatus;
use crate::entities::zip::ZipProcessingStatus;

/// Per-file outcome tally used to build the §4.11 step 5 summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileOutcomeTally {
    pub success: u32,
    pub failed: u32,
    pub ignored: u32,
    pub duplicate: u32,
}

/// Resolution the scheduler should apply to a job, or `Pending` if no
/// decision can be made yet this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobReconciliation {
    /// Work is still outstanding on at least one child; re-check next run.
    Pending,
    /// The job has no children yet (pre-queue race); re-check next run.
    AwaitingChildren,
    /// A zip reported `EXTRACTION_FAILED`; fold the job to `FAILED` with
    /// this message.
    FailFromZip(String),
    Completed,
    PartialSuccess { remark: String },
    Failed { error_message: String },
}

/// Per-file status as seen by the scheduler, paired with whether any of its
/// `GxMaster` children reported `ERROR` (§4.11 step 5: "a File counts as
/// failed if ... any Gx(sourceFileId=fileId).status=ERROR").
#[derive(Debug, Clone, Copy)]
pub struct FileOutcomeInput {
    pub status: FileProcessingStatus,
    pub has_errored_gx: bool,
}

/// Decide the reconciliation outcome for one job given its current
/// children. `first_failure_message` is the error message of the first
/// failed file, used verbatim when folding to `Failed`.
pub fn reconcile(
    zips: &[ZipProcessingStatus],
    files: &[FileOutcomeInput],
    gx: &[GxStatus],
    zip_failure_message: Option<&str>,
    first_failure_message: Option<&str>,
) -> JobReconciliation {
    if let Some(message) = zips.iter().find(|z| **z == ZipProcessingStatus::ExtractionFailed).and(zip_failure_message)
    {
        return JobReconciliation::FailFromZip(message.to_string());
    }

    let any_pending = zips.iter().any(|z| z.is_pending())
        || files.iter().any(|f| f.status.is_pending())
        || gx.iter().any(|g| g.is_pending_for_scheduler());
    if any_pending {
        return JobReconciliation::Pending;
    }

    if files.is_empty() && zips.is_empty() {
        return JobReconciliation::AwaitingChildren;
    }

    let tally = tally_file_outcomes(files);

    if tally.success > 0 && tally.failed > 0 {
        JobReconciliation::PartialSuccess { remark: format_partial_success_remark(tally) }
    } else if tally.failed > 0 {
        JobReconciliation::Failed {
            error_message: first_failure_message.unwrap_or("one or more files failed processing").to_string(),
        }
    } else {
        JobReconciliation::Completed
    }
}

fn tally_file_outcomes(files: &[FileOutcomeInput]) -> FileOutcomeTally {
    let mut tally = FileOutcomeTally::default();
    for file in files {
        match file.status {
            FileProcessingStatus::Failed => tally.failed += 1,
            FileProcessingStatus::Ignored => tally.ignored += 1,
            FileProcessingStatus::Duplicate => tally.duplicate += 1,
            FileProcessingStatus::Completed if file.has_errored_gx => tally.failed += 1,
            FileProcessingStatus::Completed => tally.success += 1,
            FileProcessingStatus::Terminated | FileProcessingStatus::Queued | FileProcessingStatus::InProgress => {}
        }
    }
    tally
}

/// `"N succeeded, M failed[, K ignored][, D duplicates]."` per §4.11 step 5.
fn format_partial_success_remark(tally: FileOutcomeTally) -> String {
    let mut remark = format!("{} succeeded, {} failed", tally.success, tally.failed);
    if tally.ignored > 0 {
        remark.push_str(&format!(", {} ignored", tally.ignored));
    }
    if tally.duplicate > 0 {
        remark.push_str(&format!(", {} duplicates", tally.duplicate));
    }
    remark.push('.');
    remark
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(status: FileProcessingStatus) -> FileOutcomeInput {
        FileOutcomeInput { status, has_errored_gx: false }
    }

    #[test]
    fn zip_extraction_failure_takes_priority() {
        let result = reconcile(
            &[ZipProcessingStatus::ExtractionFailed],
            &[],
            &[],
            Some("Bulk ZIP has an invalid structure"),
            None,
        );
        assert_eq!(result, JobReconciliation::FailFromZip("Bulk ZIP has an invalid structure".into()));
    }

    #[test]
    fn pending_children_block_reconciliation() {
        let result = reconcile(&[ZipProcessingStatus::ExtractionInProgress], &[], &[], None, None);
        assert_eq!(result, JobReconciliation::Pending);
    }

    #[test]
    fn no_children_yet_awaits() {
        let result = reconcile(&[], &[], &[], None, None);
        assert_eq!(result, JobReconciliation::AwaitingChildren);
    }

    #[test]
    fn all_completed_is_completed() {
        let files = vec![file(FileProcessingStatus::Completed), file(FileProcessingStatus::Completed)];
        let result = reconcile(&[], &files, &[], None, None);
        assert_eq!(result, JobReconciliation::Completed);
    }

    #[test]
    fn ignored_only_still_completes() {
        let files = vec![file(FileProcessingStatus::Ignored), file(FileProcessingStatus::Duplicate)];
        let result = reconcile(&[], &files, &[], None, None);
        assert_eq!(result, JobReconciliation::Completed);
    }

    #[test]
    fn mixed_success_and_failure_is_partial_success() {
        let files = vec![
            file(FileProcessingStatus::Completed),
            file(FileProcessingStatus::Completed),
            file(FileProcessingStatus::Completed),
            file(FileProcessingStatus::Failed),
            file(FileProcessingStatus::Ignored),
        ];
        let result = reconcile(&[], &files, &[], None, None);
        assert_eq!(result, JobReconciliation::PartialSuccess { remark: "3 succeeded, 1 failed, 1 ignored.".into() });
    }

    #[test]
    fn all_failed_is_failed() {
        let files = vec![file(FileProcessingStatus::Failed)];
        let result = reconcile(&[], &files, &[], None, Some("handler blew up"));
        assert_eq!(result, JobReconciliation::Failed { error_message: "handler blew up".into() });
    }

    #[test]
    fn completed_file_with_errored_gx_counts_as_failed() {
        let files = vec![FileOutcomeInput { status: FileProcessingStatus::Completed, has_errored_gx: true }];
        let result = reconcile(&[], &files, &[], None, Some("gx upload failed"));
        assert_eq!(result, JobReconciliation::Failed { error_message: "gx upload failed".into() });
    }
}

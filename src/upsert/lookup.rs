/// Name-keyed lookup over listed workflows

use crate::workflow::RemoteWorkflowRecord;

/// First record whose name equals `name` exactly, in the order received.
///
/// Uniqueness of names on the service is not enforced; later duplicates are ignored.
pub fn find_by_name<'a>(records: &'a [RemoteWorkflowRecord], name: &str) -> Option<&'a RemoteWorkflowRecord> {
    records.iter().find(|record| record.name == name)
}

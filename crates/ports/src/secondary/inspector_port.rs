use std::future::Future;
use std::pin::Pin;

use domain::attribute::entity::Attribute;
use domain::common::error::DomainError;
use domain::task::entity::{TaskContext, TaskResult};

/// Inspector business logic: enriches one attribute of a report.
///
/// Returning `Ok(None)` means the inspector declined the attribute (for
/// example, the attribute type is not relevant to it).
pub trait Inspector: Send + Sync {
    fn inspect<'a>(
        &'a self,
        ctx: &'a TaskContext,
        attribute: &'a Attribute,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TaskResult>, DomainError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::attribute::entity::AttrType;
    use domain::common::entity::ReportId;

    struct DeclineAll;
    impl Inspector for DeclineAll {
        fn inspect<'a>(
            &'a self,
            _ctx: &'a TaskContext,
            _attribute: &'a Attribute,
        ) -> Pin<Box<dyn Future<Output = Result<Option<TaskResult>, DomainError>> + Send + 'a>>
        {
            Box::pin(async { Ok(None) })
        }
    }

    #[tokio::test]
    async fn inspector_is_dyn_compatible() {
        let inspector: Box<dyn Inspector> = Box::new(DeclineAll);
        let ctx = TaskContext {
            report_id: ReportId::from("r-1"),
        };
        let attr = Attribute::new(AttrType::Url, "link", "https://example.com");
        assert!(inspector.inspect(&ctx, &attr).await.unwrap().is_none());
    }
}

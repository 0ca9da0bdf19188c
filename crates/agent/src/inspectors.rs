use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;

use domain::attribute::entity::{AttrType, Attribute};
use domain::common::error::DomainError;
use domain::report::entity::{ReportContent, ReportHost};
use domain::task::entity::{TaskContext, TaskResult};
use ports::secondary::inspector_port::Inspector;

/// Built-in inspector for `ipaddr` attributes.
///
/// Classifies the address by its reserved range and reports it as a host.
/// An IPv4-mapped IPv6 address also yields its IPv4 form as a new
/// attribute. Every other attribute type is declined.
pub struct IpAddrInspector;

impl IpAddrInspector {
    fn inspect_addr(attribute: &Attribute) -> Result<TaskResult, DomainError> {
        let addr: IpAddr = attribute.value.trim().parse().map_err(|e| {
            DomainError::InvalidInput(format!("'{}' is not an IP address: {e}", attribute.value))
        })?;

        let host = ReportHost {
            ip_addr: vec![addr.to_string()],
            as_owner: vec![classify(addr).to_string()],
            ..Default::default()
        };

        let mut new_attributes = Vec::new();
        if let IpAddr::V6(v6) = addr
            && let Some(v4) = v6.to_ipv4_mapped()
        {
            let mut mapped = attribute.clone();
            mapped.value = v4.to_string();
            new_attributes.push(mapped);
        }

        Ok(TaskResult {
            contents: vec![ReportContent::Host(host)],
            new_attributes,
        })
    }
}

impl Inspector for IpAddrInspector {
    fn inspect<'a>(
        &'a self,
        ctx: &'a TaskContext,
        attribute: &'a Attribute,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TaskResult>, DomainError>> + Send + 'a>> {
        Box::pin(async move {
            if attribute.attr_type != AttrType::IpAddr {
                return Ok(None);
            }
            tracing::debug!(report_id = %ctx.report_id, value = %attribute.value, "inspecting address");
            Self::inspect_addr(attribute).map(Some)
        })
    }
}

/// Reserved range an address falls in.
fn classify(addr: IpAddr) -> &'static str {
    match addr {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            if v4.is_loopback() {
                "loopback"
            } else if v4.is_private() {
                "private network"
            } else if v4.is_link_local() {
                "link-local"
            } else if a == 100 && (64..128).contains(&b) {
                "shared address space"
            } else if v4.is_documentation() {
                "documentation"
            } else if v4.is_multicast() {
                "multicast"
            } else if v4.is_unspecified() || v4.is_broadcast() {
                "reserved"
            } else {
                "public"
            }
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return classify(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            if v6.is_loopback() {
                "loopback"
            } else if v6.is_unspecified() {
                "reserved"
            } else if v6.is_multicast() {
                "multicast"
            } else if first & 0xfe00 == 0xfc00 {
                "private network"
            } else if first & 0xffc0 == 0xfe80 {
                "link-local"
            } else if first == 0x2001 && v6.segments()[1] == 0x0db8 {
                "documentation"
            } else {
                "public"
            }
        }
    }
}

use std::fmt::Write as _;

use super::payload::DigestPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

pub fn format_email(payload: &DigestPayload) -> EmailContent {
    let target_date = payload.target_date_hkt.format("%Y-%m-%d").to_string();
    let subject = format!("[HKEX AP] {} 新增 {} 家", target_date, payload.count);

    let mut body = String::new();
    writeln!(body, "港交所前一日递表名单（AP）").expect("write heading");
    writeln!(body, "目标日期（HKT）：{target_date}").expect("write target date");
    writeln!(
        body,
        "生成时间（HKT）：{}",
        payload.generated_at_hkt.to_rfc3339()
    )
    .expect("write generated at");
    writeln!(body, "数量：{}", payload.count).expect("write count");
    body.push('\n');

    if payload.count == 0 || payload.items.is_empty() {
        writeln!(body, "昨日（HKT）无新增 AP 递表。").expect("write empty note");
    } else {
        for (index, item) in payload.items.iter().enumerate() {
            writeln!(body, "{}. {}", index + 1, item.applicant_name).expect("write name");
            writeln!(body, "   - 日期: {}", item.posting_date_hkt.format("%Y-%m-%d"))
                .expect("write date");
            writeln!(body, "   - 类型: {}", item.doc_type.label()).expect("write type");
            writeln!(body, "   - 板块: {}", item.board.label()).expect("write board");
            writeln!(body, "   - 链接: {}", item.link).expect("write link");
            body.push('\n');
        }
    }

    writeln!(body, "-----").expect("write separator");
    write!(body, "Source: {}", payload.source).expect("write source");

    if let Some(debug) = &payload.debug {
        write!(
            body,
            "\nDebug: raw_rows={}, parsed_records={}",
            debug.raw_row_count, debug.parsed_record_count
        )
        .expect("write debug");
        if !debug.doc_type_distribution.is_empty() {
            let distribution = debug
                .doc_type_distribution
                .iter()
                .map(|(doc_type, count)| format!("{doc_type}={count}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(body, "\nDocTypeDist: {distribution}").expect("write distribution");
        }
    }

    EmailContent { subject, body }
}

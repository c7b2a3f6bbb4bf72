//! 表结构
//!
//! 人员表固定不变，借款表随担保人存储方式变化。

use crate::core::models::{GuarantorLayout, FIXED_GUARANTOR_COLUMNS};
use rusqlite::{params, Connection};

/// GROUP_CONCAT 使用的分隔符（ASCII 单元分隔符，不会出现在姓名中）
pub const NAME_SEPARATOR: char = '\u{1f}';

const PERSONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS persons (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        ssn TEXT NOT NULL UNIQUE,
        job TEXT,
        score TEXT
    );
"#;

/// 固定担保人列名：guarantor1_id .. guarantor5_id
pub fn fixed_guarantor_columns() -> Vec<String> {
    (1..=FIXED_GUARANTOR_COLUMNS)
        .map(|i| format!("guarantor{}_id", i))
        .collect()
}

/// 按担保人结构建表
pub fn create_tables(conn: &Connection, layout: GuarantorLayout) -> rusqlite::Result<()> {
    let guarantor_columns = match layout {
        GuarantorLayout::SingleColumn => {
            ",\n        guarantor_id INTEGER REFERENCES persons(id)".to_string()
        }
        GuarantorLayout::JoinTable => String::new(),
        GuarantorLayout::FixedColumns => fixed_guarantor_columns()
            .iter()
            .map(|c| format!(",\n        {} INTEGER REFERENCES persons(id)", c))
            .collect(),
    };

    let mut sql = String::from(PERSONS_TABLE);
    sql.push_str(&format!(
        r#"
    CREATE TABLE IF NOT EXISTS loans (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        borrower_id INTEGER NOT NULL REFERENCES persons(id),
        amount REAL NOT NULL CHECK (amount > 0),
        percentage REAL,
        description TEXT,
        date TEXT{}
    );

    CREATE INDEX IF NOT EXISTS idx_loans_borrower ON loans(borrower_id);
"#,
        guarantor_columns
    ));

    if layout == GuarantorLayout::JoinTable {
        sql.push_str(
            r#"
    CREATE TABLE IF NOT EXISTS loan_guarantors (
        loan_id INTEGER NOT NULL REFERENCES loans(id) ON DELETE CASCADE,
        person_id INTEGER NOT NULL REFERENCES persons(id),
        PRIMARY KEY (loan_id, person_id)
    );

    CREATE INDEX IF NOT EXISTS idx_loan_guarantors_person ON loan_guarantors(person_id);
"#,
        );
    }

    conn.execute_batch(&sql)
}

/// 根据已有 loans 表的列识别担保人结构
///
/// loans 表不存在时返回 None。
pub fn detect_layout(conn: &Connection) -> rusqlite::Result<Option<GuarantorLayout>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map(params!["loans"], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if columns.is_empty() {
        return Ok(None);
    }

    let layout = if columns.iter().any(|c| c == "guarantor1_id") {
        GuarantorLayout::FixedColumns
    } else if columns.iter().any(|c| c == "guarantor_id") {
        GuarantorLayout::SingleColumn
    } else {
        GuarantorLayout::JoinTable
    };
    Ok(Some(layout))
}

/// 借款列表查询
///
/// 前七列固定：id, borrower_id, borrower_name, amount, percentage, description, date，
/// 之后是担保人姓名列（关联表为一列 GROUP_CONCAT，固定列结构为五列）。
pub fn loan_list_sql(layout: GuarantorLayout) -> String {
    const BASE: &str = "SELECT l.id, l.borrower_id, b.name, l.amount, l.percentage, \
                        COALESCE(l.description, ''), COALESCE(l.date, '')";

    match layout {
        GuarantorLayout::SingleColumn => format!(
            "{BASE}, g.name
             FROM loans l
             LEFT JOIN persons b ON b.id = l.borrower_id
             LEFT JOIN persons g ON g.id = l.guarantor_id
             ORDER BY l.id DESC"
        ),
        GuarantorLayout::JoinTable => format!(
            "{BASE}, GROUP_CONCAT(g.name, char(31) ORDER BY lg.rowid)
             FROM loans l
             LEFT JOIN persons b ON b.id = l.borrower_id
             LEFT JOIN loan_guarantors lg ON lg.loan_id = l.id
             LEFT JOIN persons g ON g.id = lg.person_id
             GROUP BY l.id
             ORDER BY l.id DESC"
        ),
        GuarantorLayout::FixedColumns => {
            let columns = fixed_guarantor_columns();
            let names: Vec<String> = (1..=columns.len()).map(|i| format!("g{}.name", i)).collect();
            let joins: Vec<String> = columns
                .iter()
                .enumerate()
                .map(|(i, c)| format!("LEFT JOIN persons g{n} ON g{n}.id = l.{c}", n = i + 1))
                .collect();
            format!(
                "{BASE}, {}
             FROM loans l
             LEFT JOIN persons b ON b.id = l.borrower_id
             {}
             ORDER BY l.id DESC",
                names.join(", "),
                joins.join("\n             ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_each_layout() {
        for layout in GuarantorLayout::ALL {
            let conn = Connection::open_in_memory().unwrap();
            assert_eq!(detect_layout(&conn).unwrap(), None);
            create_tables(&conn, layout).unwrap();
            assert_eq!(detect_layout(&conn).unwrap(), Some(layout));
        }
    }

    #[test]
    fn test_detect_unconstrained_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE loans (id INTEGER PRIMARY KEY, borrower_id INTEGER, guarantor_id INTEGER,
                                 amount REAL, percentage REAL, description TEXT, date TEXT);",
        )
        .unwrap();
        assert_eq!(detect_layout(&conn).unwrap(), Some(GuarantorLayout::SingleColumn));
        create_tables(&conn, GuarantorLayout::SingleColumn).unwrap();
        conn.prepare(&loan_list_sql(GuarantorLayout::SingleColumn)).unwrap();

        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE loans (id INTEGER PRIMARY KEY, borrower_id INTEGER, amount REAL,
                                 guarantor1_id INTEGER, guarantor2_id INTEGER, guarantor3_id INTEGER,
                                 guarantor4_id INTEGER, guarantor5_id INTEGER);",
        )
        .unwrap();
        assert_eq!(detect_layout(&conn).unwrap(), Some(GuarantorLayout::FixedColumns));
    }

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn, GuarantorLayout::JoinTable).unwrap();
        create_tables(&conn, GuarantorLayout::JoinTable).unwrap();
    }

    #[test]
    fn test_list_sql_prepares_for_every_layout() {
        for layout in GuarantorLayout::ALL {
            let conn = Connection::open_in_memory().unwrap();
            create_tables(&conn, layout).unwrap();
            let stmt = conn.prepare(&loan_list_sql(layout)).unwrap();
            let expected = match layout {
                GuarantorLayout::FixedColumns => 7 + FIXED_GUARANTOR_COLUMNS,
                _ => 8,
            };
            assert_eq!(stmt.column_count(), expected);
        }
    }
}

//! 数据库存储模块
//!
//! 使用SQLite存储人员、借款和担保关系。所有语句同步执行。

use crate::core::error::{LedgerError, Result};
use crate::core::models::{GuarantorLayout, LoanRow, LoanTotals, NewLoan, NewPerson, Person};
use crate::storage::schema::{self, NAME_SEPARATOR};
use rusqlite::{ffi, params, params_from_iter, types::Value, Connection, Row};
use std::path::Path;

const PERSON_COLUMNS: &str = "id, name, ssn, job, score";

/// 数据库管理器
pub struct Database {
    conn: Connection,
    layout: GuarantorLayout,
}

impl Database {
    /// 打开或创建数据库
    ///
    /// 已有的 loans 表决定担保人结构；`preferred` 仅用于新建数据库。
    pub fn open(path: &Path, preferred: GuarantorLayout) -> Result<Self> {
        // 确保目录存在
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let db = Self::init(conn, preferred)?;
        tracing::info!(
            "已打开数据库: {} ({})",
            path.display(),
            db.layout.label()
        );
        Ok(db)
    }

    /// 内存数据库
    pub fn open_in_memory(preferred: GuarantorLayout) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, preferred)
    }

    fn init(conn: Connection, preferred: GuarantorLayout) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;

        let layout = match schema::detect_layout(&conn)? {
            Some(existing) => {
                if existing != preferred {
                    tracing::warn!(
                        "数据库已使用 {:?} 结构，忽略配置中的 {:?}",
                        existing,
                        preferred
                    );
                }
                existing
            }
            None => preferred,
        };

        schema::create_tables(&conn, layout)?;
        Ok(Self { conn, layout })
    }

    /// 当前担保人结构
    pub fn layout(&self) -> GuarantorLayout {
        self.layout
    }

    // ---------- 人员 ----------

    /// 添加人员，返回新ID
    pub fn add_person(&self, person: &NewPerson) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO persons (name, ssn, job, score) VALUES (?1, ?2, ?3, ?4)",
                params![
                    person.name,
                    person.ssn,
                    person.job,
                    person.score.unwrap_or_default().as_str()
                ],
            )
            .map_err(|e| person_write_error(e, &person.ssn))?;

        let id = self.conn.last_insert_rowid();
        tracing::info!("已添加人员 #{}: {}", id, person.name);
        Ok(id)
    }

    /// 修改人员
    pub fn update_person(&self, id: i64, person: &NewPerson) -> Result<()> {
        let affected = self
            .conn
            .execute(
                "UPDATE persons SET name = ?1, ssn = ?2, job = ?3, score = COALESCE(?4, score)
                 WHERE id = ?5",
                params![
                    person.name,
                    person.ssn,
                    person.job,
                    person.score.map(|s| s.as_str()),
                    id
                ],
            )
            .map_err(|e| person_write_error(e, &person.ssn))?;

        if affected == 0 {
            return Err(LedgerError::PersonNotFound(id));
        }
        tracing::info!("已修改人员 #{}", id);
        Ok(())
    }

    /// 删除人员
    ///
    /// 仍作为借款人或担保人被引用时失败。
    pub fn delete_person(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM persons WHERE id = ?1", params![id])
            .map_err(|e| {
                if extended_code(&e) == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) {
                    LedgerError::PersonInUse(id)
                } else {
                    e.into()
                }
            })?;

        if affected == 0 {
            return Err(LedgerError::PersonNotFound(id));
        }
        tracing::info!("已删除人员 #{}", id);
        Ok(())
    }

    /// 所有人员
    pub fn list_persons(&self) -> Result<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY id"))?;
        let persons = stmt.query_map([], person_from_row)?;
        persons.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// 按ID查找人员
    pub fn find_person(&self, id: i64) -> Result<Option<Person>> {
        let result = self.conn.query_row(
            &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1"),
            params![id],
            person_from_row,
        );

        match result {
            Ok(person) => Ok(Some(person)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ---------- 借款 ----------

    /// 添加借款及其担保人，返回新ID
    ///
    /// 借款和担保人在同一事务中写入，任一担保人写入失败则整笔借款回滚。
    pub fn add_loan(&mut self, loan: &NewLoan) -> Result<i64> {
        if let Some(max) = self.layout.max_guarantors() {
            if loan.guarantor_ids.len() > max {
                return Err(LedgerError::TooManyGuarantors {
                    count: loan.guarantor_ids.len(),
                    max,
                });
            }
        }

        let date = loan.date.format("%Y-%m-%d").to_string();
        let mut values: Vec<Value> = vec![
            loan.borrower_id.into(),
            loan.amount.into(),
            loan.percentage.into(),
            loan.description.clone().into(),
            date.into(),
        ];
        let mut columns = vec!["borrower_id", "amount", "percentage", "description", "date"];

        let fixed_columns = schema::fixed_guarantor_columns();
        match self.layout {
            GuarantorLayout::SingleColumn => {
                columns.push("guarantor_id");
                values.push(loan.guarantor_ids.first().copied().into());
            }
            GuarantorLayout::FixedColumns => {
                for (i, column) in fixed_columns.iter().enumerate() {
                    columns.push(column);
                    values.push(loan.guarantor_ids.get(i).copied().into());
                }
            }
            GuarantorLayout::JoinTable => {}
        }

        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO loans ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );

        let layout = self.layout;
        let tx = self.conn.transaction()?;
        tx.execute(&sql, params_from_iter(values))?;
        let loan_id = tx.last_insert_rowid();

        if layout == GuarantorLayout::JoinTable {
            for person_id in &loan.guarantor_ids {
                if let Err(e) = tx.execute(
                    "INSERT INTO loan_guarantors (loan_id, person_id) VALUES (?1, ?2)",
                    params![loan_id, person_id],
                ) {
                    tracing::warn!("写入担保人 #{} 失败，回滚借款: {}", person_id, e);
                    return Err(e.into());
                }
            }
        }

        tx.commit()?;
        tracing::info!(
            "已添加借款 #{}: 借款人 #{}，金额 {}，担保人 {} 名",
            loan_id,
            loan.borrower_id,
            loan.amount,
            loan.guarantor_ids.len()
        );
        Ok(loan_id)
    }

    /// 删除借款（关联表中的担保关系随之删除）
    pub fn delete_loan(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM loans WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(LedgerError::LoanNotFound(id));
        }
        tracing::info!("已删除借款 #{}", id);
        Ok(())
    }

    /// 借款列表（联表查询，最新的在前）
    pub fn list_loans(&self) -> Result<Vec<LoanRow>> {
        let sql = schema::loan_list_sql(self.layout);
        let mut stmt = self.conn.prepare(&sql)?;
        let guarantor_columns = stmt.column_count() - 7;
        let layout = self.layout;

        let rows = stmt.query_map([], |row| {
            let mut guarantor_names = Vec::new();
            for i in 0..guarantor_columns {
                let value: Option<String> = row.get(7 + i)?;
                let Some(value) = value else { continue };
                if layout == GuarantorLayout::JoinTable {
                    guarantor_names.extend(value.split(NAME_SEPARATOR).map(str::to_string));
                } else {
                    guarantor_names.push(value);
                }
            }

            Ok(LoanRow {
                id: row.get(0)?,
                borrower_id: row.get(1)?,
                borrower_name: row.get(2)?,
                amount: row.get(3)?,
                percentage: row.get(4)?,
                description: row.get(5)?,
                date: row.get(6)?,
                guarantor_names,
            })
        })?;

        let loans = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        tracing::debug!("已加载 {} 笔借款", loans.len());
        Ok(loans)
    }

    /// 某笔借款的担保人
    pub fn loan_guarantors(&self, loan_id: i64) -> Result<Vec<Person>> {
        let ids: Vec<i64> = match self.layout {
            GuarantorLayout::JoinTable => {
                let mut stmt = self.conn.prepare(
                    "SELECT person_id FROM loan_guarantors WHERE loan_id = ?1 ORDER BY rowid",
                )?;
                let ids = stmt.query_map(params![loan_id], |row| row.get(0))?;
                ids.collect::<rusqlite::Result<Vec<_>>>()?
            }
            GuarantorLayout::SingleColumn => {
                let id: Option<i64> = self.loan_column(loan_id, "guarantor_id")?;
                id.into_iter().collect()
            }
            GuarantorLayout::FixedColumns => {
                let mut ids = Vec::new();
                for column in schema::fixed_guarantor_columns() {
                    if let Some(id) = self.loan_column(loan_id, &column)? {
                        ids.push(id);
                    }
                }
                ids
            }
        };

        let mut persons = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(person) = self.find_person(id)? {
                persons.push(person);
            }
        }
        Ok(persons)
    }

    fn loan_column(&self, loan_id: i64, column: &str) -> Result<Option<i64>> {
        self.conn
            .query_row(
                &format!("SELECT {column} FROM loans WHERE id = ?1"),
                params![loan_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => LedgerError::LoanNotFound(loan_id),
                other => other.into(),
            })
    }

    /// 借款数量与总金额
    pub fn loan_totals(&self) -> Result<LoanTotals> {
        let (count, total_amount) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(amount), 0.0) FROM loans",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?)),
        )?;
        Ok(LoanTotals {
            count: count as usize,
            total_amount,
        })
    }
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        ssn: row.get(2)?,
        job: row.get(3)?,
        score: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}

fn extended_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => Some(e.extended_code),
        _ => None,
    }
}

/// 身份证号唯一约束冲突映射为 DuplicateSsn
fn person_write_error(err: rusqlite::Error, ssn: &str) -> LedgerError {
    if extended_code(&err) == Some(ffi::SQLITE_CONSTRAINT_UNIQUE) {
        LedgerError::DuplicateSsn(ssn.to_string())
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Score;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn new_person(name: &str, ssn: &str) -> NewPerson {
        NewPerson {
            name: name.to_string(),
            ssn: ssn.to_string(),
            job: None,
            score: Some(Score::A),
        }
    }

    fn new_loan(borrower_id: i64, guarantor_ids: Vec<i64>) -> NewLoan {
        NewLoan {
            borrower_id,
            guarantor_ids,
            amount: 2500.0,
            percentage: Some(4.0),
            description: "تعمیر خانه".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
        }
    }

    /// 返回数据库和三个人员ID
    fn seeded(layout: GuarantorLayout) -> (Database, i64, i64, i64) {
        let db = Database::open_in_memory(layout).unwrap();
        let a = db.add_person(&new_person("Reza", "001")).unwrap();
        let b = db.add_person(&new_person("Mina", "002")).unwrap();
        let c = db.add_person(&new_person("Omid", "003")).unwrap();
        (db, a, b, c)
    }

    #[test]
    fn test_database_init() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("ledger.db");

        let db = Database::open(&db_path, GuarantorLayout::JoinTable).unwrap();
        assert!(db_path.exists());
        assert_eq!(db.layout(), GuarantorLayout::JoinTable);
    }

    #[test]
    fn test_existing_layout_wins_over_preference() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("ledger.db");

        drop(Database::open(&db_path, GuarantorLayout::FixedColumns).unwrap());
        let db = Database::open(&db_path, GuarantorLayout::SingleColumn).unwrap();
        assert_eq!(db.layout(), GuarantorLayout::FixedColumns);
    }

    #[test]
    fn test_open_legacy_single_guarantor_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch(
                r#"
                CREATE TABLE persons (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    ssn TEXT NOT NULL UNIQUE,
                    job TEXT,
                    score TEXT
                );
                CREATE TABLE loans (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    borrower_id INTEGER,
                    guarantor_id INTEGER,
                    amount REAL,
                    percentage REAL,
                    description TEXT,
                    date TEXT
                );
                INSERT INTO persons (name, ssn, job, score) VALUES ('Reza', '001', NULL, 'خوب');
                INSERT INTO persons (name, ssn, job, score) VALUES ('Mina', '002', 'Clerk', 'A');
                INSERT INTO loans (borrower_id, guarantor_id, amount, percentage, description, date)
                    VALUES (1, 2, 1000, 0, 'وام', '2023-05-01');
                INSERT INTO loans (borrower_id, guarantor_id, amount, percentage, description, date)
                    VALUES (9, NULL, 50, NULL, NULL, NULL);
                "#,
            )
            .unwrap();
        }

        let mut db = Database::open(&db_path, GuarantorLayout::JoinTable).unwrap();
        assert_eq!(db.layout(), GuarantorLayout::SingleColumn);

        let loans = db.list_loans().unwrap();
        assert_eq!(loans.len(), 2);
        assert_eq!(loans[0].borrower_name, None);
        assert_eq!(loans[0].description, "");
        assert!(loans[0].guarantor_names.is_empty());
        assert_eq!(loans[1].borrower_name.as_deref(), Some("Reza"));
        assert_eq!(loans[1].percentage, Some(0.0));
        assert_eq!(loans[1].date, "2023-05-01");
        assert_eq!(loans[1].guarantor_names, vec!["Mina"]);
        assert_eq!(db.find_person(1).unwrap().unwrap().score, "خوب");

        let id = db.add_loan(&new_loan(2, vec![1])).unwrap();
        let names: Vec<String> = db
            .loan_guarantors(id)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Reza"]);
    }

    #[test]
    fn test_add_and_list_persons() {
        let (db, a, _, _) = seeded(GuarantorLayout::JoinTable);
        let persons = db.list_persons().unwrap();
        assert_eq!(persons.len(), 3);
        assert_eq!(persons[0].id, a);
        assert_eq!(persons[0].name, "Reza");
        assert_eq!(persons[0].score, "A");
        assert_eq!(persons[0].job, None);
    }

    #[test]
    fn test_duplicate_ssn_rejected() {
        let (db, _, _, _) = seeded(GuarantorLayout::JoinTable);
        let err = db.add_person(&new_person("Other", "001")).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateSsn(ref ssn) if ssn == "001"));
        assert_eq!(db.list_persons().unwrap().len(), 3);
    }

    #[test]
    fn test_update_person() {
        let (db, a, _, _) = seeded(GuarantorLayout::JoinTable);
        let mut changed = new_person("Reza Karimi", "001");
        changed.job = Some("Driver".to_string());
        changed.score = Some(Score::B);
        db.update_person(a, &changed).unwrap();

        let person = db.find_person(a).unwrap().unwrap();
        assert_eq!(person.name, "Reza Karimi");
        assert_eq!(person.job.as_deref(), Some("Driver"));
        assert_eq!(person.score, "B");

        let err = db.update_person(a, &new_person("Reza", "002")).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateSsn(_)));
        assert!(matches!(
            db.update_person(999, &new_person("X", "999")),
            Err(LedgerError::PersonNotFound(999))
        ));
    }

    #[test]
    fn test_update_without_grade_keeps_stored_score() {
        let (db, a, _, _) = seeded(GuarantorLayout::JoinTable);
        db.conn
            .execute("UPDATE persons SET score = 'خوب' WHERE id = ?1", params![a])
            .unwrap();

        let mut changed = new_person("Reza", "001");
        changed.job = Some("Driver".to_string());
        changed.score = None;
        db.update_person(a, &changed).unwrap();

        let person = db.find_person(a).unwrap().unwrap();
        assert_eq!(person.job.as_deref(), Some("Driver"));
        assert_eq!(person.score, "خوب");
    }

    #[test]
    fn test_delete_person() {
        let (db, a, b, c) = seeded(GuarantorLayout::JoinTable);
        db.delete_person(c).unwrap();
        assert!(db.find_person(c).unwrap().is_none());
        assert!(matches!(db.delete_person(c), Err(LedgerError::PersonNotFound(_))));

        let mut db = db;
        db.add_loan(&new_loan(a, vec![b])).unwrap();
        assert!(matches!(db.delete_person(a), Err(LedgerError::PersonInUse(_))));
        assert!(matches!(db.delete_person(b), Err(LedgerError::PersonInUse(_))));
    }

    #[test]
    fn test_loan_with_guarantors_every_layout() {
        for layout in GuarantorLayout::ALL {
            let (mut db, a, b, c) = seeded(layout);
            let guarantors = match layout {
                GuarantorLayout::SingleColumn => vec![b],
                _ => vec![c, b],
            };
            let loan_id = db.add_loan(&new_loan(a, guarantors.clone())).unwrap();

            let loans = db.list_loans().unwrap();
            assert_eq!(loans.len(), 1, "{:?}", layout);
            let row = &loans[0];
            assert_eq!(row.id, loan_id);
            assert_eq!(row.borrower_name.as_deref(), Some("Reza"));
            assert_eq!(row.amount, 2500.0);
            assert_eq!(row.percentage, Some(4.0));
            assert_eq!(row.date, "2024-03-20");
            assert_eq!(row.description, "تعمیر خانه");

            let mut names = row.guarantor_names.clone();
            names.sort();
            let mut expected: Vec<String> = guarantors
                .iter()
                .map(|id| db.find_person(*id).unwrap().unwrap().name)
                .collect();
            expected.sort();
            assert_eq!(names, expected, "{:?}", layout);

            let persons = db.loan_guarantors(loan_id).unwrap();
            let ids: Vec<i64> = persons.iter().map(|p| p.id).collect();
            assert_eq!(ids, guarantors, "{:?}", layout);
        }
    }

    #[test]
    fn test_loan_without_guarantors() {
        for layout in GuarantorLayout::ALL {
            let (mut db, a, _, _) = seeded(layout);
            let mut loan = new_loan(a, Vec::new());
            loan.percentage = None;
            loan.description = String::new();
            let id = db.add_loan(&loan).unwrap();

            let loans = db.list_loans().unwrap();
            assert!(loans[0].guarantor_names.is_empty());
            assert_eq!(loans[0].percentage, None);
            assert!(db.loan_guarantors(id).unwrap().is_empty());
        }
    }

    #[test]
    fn test_too_many_guarantors_writes_nothing() {
        let (mut db, a, b, c) = seeded(GuarantorLayout::SingleColumn);
        let err = db.add_loan(&new_loan(a, vec![b, c])).unwrap_err();
        assert!(matches!(err, LedgerError::TooManyGuarantors { count: 2, max: 1 }));
        assert!(db.list_loans().unwrap().is_empty());
    }

    #[test]
    fn test_failed_guarantor_rolls_back_loan() {
        let (mut db, a, b, _) = seeded(GuarantorLayout::JoinTable);
        let err = db.add_loan(&new_loan(a, vec![b, 999])).unwrap_err();
        assert!(matches!(err, LedgerError::Database(_)));
        assert!(db.list_loans().unwrap().is_empty());
        assert_eq!(db.loan_totals().unwrap().count, 0);
    }

    #[test]
    fn test_unknown_borrower_rejected() {
        let (mut db, _, _, _) = seeded(GuarantorLayout::FixedColumns);
        assert!(db.add_loan(&new_loan(999, Vec::new())).is_err());
        assert!(db.list_loans().unwrap().is_empty());
    }

    #[test]
    fn test_delete_loan_releases_guarantors() {
        let (mut db, a, b, _) = seeded(GuarantorLayout::JoinTable);
        let loan_id = db.add_loan(&new_loan(a, vec![b])).unwrap();
        db.delete_loan(loan_id).unwrap();

        assert!(db.list_loans().unwrap().is_empty());
        db.delete_person(b).unwrap();
        assert!(matches!(db.delete_loan(loan_id), Err(LedgerError::LoanNotFound(_))));
    }

    #[test]
    fn test_loans_listed_newest_first_with_totals() {
        let (mut db, a, b, _) = seeded(GuarantorLayout::JoinTable);
        let first = db.add_loan(&new_loan(a, Vec::new())).unwrap();
        let mut second = new_loan(b, Vec::new());
        second.amount = 500.0;
        let second = db.add_loan(&second).unwrap();

        let ids: Vec<i64> = db.list_loans().unwrap().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![second, first]);

        let totals = db.loan_totals().unwrap();
        assert_eq!(totals.count, 2);
        assert_eq!(totals.total_amount, 3000.0);
    }

    #[test]
    fn test_loan_guarantors_missing_loan() {
        let db = Database::open_in_memory(GuarantorLayout::SingleColumn).unwrap();
        assert!(matches!(db.loan_guarantors(42), Err(LedgerError::LoanNotFound(42))));
    }
}

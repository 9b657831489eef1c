use schoolrec_core::db::open_db_in_memory;
use schoolrec_core::{
    CcaRepository, ClassRepository, ImportDefaults, ImportError, ImportService, RepoError,
    SqliteCcaRepository, SqliteClassRepository, SqliteStudentRepository, StudentRepository,
};

const STUDENTS_CSV: &str = "\
student_name,class_id,year_enrolled
Ben Ong,J2-01,2022
Cara Lim,J2-01,2022
Dev Nair,J2-02,2021
";

const CCAS_CSV: &str = "\
name,type
Choir,Performing Arts
\"Chess, Go and Xiangqi\",Clubs
";

fn service(
    conn: &rusqlite::Connection,
) -> ImportService<SqliteClassRepository<'_>, SqliteStudentRepository<'_>, SqliteCcaRepository<'_>>
{
    ImportService::new(
        SqliteClassRepository::try_new(conn).unwrap(),
        SqliteStudentRepository::try_new(conn).unwrap(),
        SqliteCcaRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn student_import_creates_missing_classes_with_defaults() {
    let conn = open_db_in_memory().unwrap();

    let report = service(&conn).import_students(STUDENTS_CSV).unwrap();
    assert_eq!(report.added, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.classes_created, 2);
    assert!(report.rejected.is_empty());

    let classes = SqliteClassRepository::try_new(&conn).unwrap();
    let class = classes.get_info("J2-02").unwrap();
    assert_eq!(class.level, "J2");

    let students = SqliteStudentRepository::try_new(&conn).unwrap();
    let ben = students.get("Ben").unwrap();
    assert_eq!(ben.age, 18);
    assert_eq!(ben.grad_year, 2023);
    assert_eq!(ben.year_enrolled, 2022);
    assert_eq!(ben.class_name, "J2-01");
}

#[test]
fn importing_the_same_file_twice_adds_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service.import_students(STUDENTS_CSV).unwrap();
    let second = service.import_students(STUDENTS_CSV).unwrap();

    assert_eq!(second.added, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(second.classes_created, 0);
    assert_eq!(
        SqliteStudentRepository::try_new(&conn)
            .unwrap()
            .list_all()
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn bad_rows_are_reported_without_aborting() {
    let conn = open_db_in_memory().unwrap();
    let source = "\
student_name,class_id,year_enrolled
Ben Ong,J2-01,twenty
,J2-01,2022
Cara Lim,J2-01,2022
";

    let report = service(&conn).import_students(source).unwrap();
    assert_eq!(report.added, 1);
    let lines: Vec<usize> = report.rejected.iter().map(|row| row.line).collect();
    assert_eq!(lines, vec![2, 3]);
    assert!(report.rejected[0].reason.contains("twenty"));
}

#[test]
fn rejected_row_does_not_create_its_class() {
    let conn = open_db_in_memory().unwrap();

    let report = service(&conn)
        .import_students("student_name,class_id,year_enrolled\n,J9-99,2022\n")
        .unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.classes_created, 0);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].line, 2);
    assert!(SqliteClassRepository::try_new(&conn)
        .unwrap()
        .list_all()
        .unwrap()
        .is_empty());
}

#[test]
fn skipped_duplicate_does_not_create_its_class() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service
        .import_students("student_name,class_id,year_enrolled\nBen Ong,J2-01,2022\n")
        .unwrap();
    let report = service
        .import_students("student_name,class_id,year_enrolled\nBen Ong,J3-05,2022\n")
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.classes_created, 0);
    assert!(matches!(
        SqliteClassRepository::try_new(&conn)
            .unwrap()
            .get_info("J3-05"),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn custom_defaults_apply_to_new_rows() {
    let conn = open_db_in_memory().unwrap();
    let defaults = ImportDefaults {
        age: 17,
        grad_year: 2025,
        class_level: "J1".to_string(),
    };

    service(&conn)
        .with_defaults(defaults)
        .import_students(STUDENTS_CSV)
        .unwrap();

    let ben = SqliteStudentRepository::try_new(&conn)
        .unwrap()
        .get("Ben")
        .unwrap();
    assert_eq!(ben.age, 17);
    assert_eq!(ben.grad_year, 2025);
    assert_eq!(
        SqliteClassRepository::try_new(&conn)
            .unwrap()
            .get_info("J2-01")
            .unwrap()
            .level,
        "J1"
    );
}

#[test]
fn cca_import_handles_quoted_names_and_skips_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let first = service.import_ccas(CCAS_CSV).unwrap();
    assert_eq!(first.added, 2);
    let second = service.import_ccas(CCAS_CSV).unwrap();
    assert_eq!(second.skipped, 2);

    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();
    let chess = ccas.get("Xiangqi").unwrap();
    assert_eq!(chess.name, "Chess, Go and Xiangqi");
    assert_eq!(chess.kind, "Clubs");
}

#[test]
fn quoted_field_may_contain_a_line_break() {
    let conn = open_db_in_memory().unwrap();

    let report = service(&conn)
        .import_ccas("name,type\nChoir,\"Performing\nArts\"\nChess,Clubs\nRobotics,\n")
        .unwrap();
    assert_eq!(report.added, 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].line, 5);

    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();
    assert_eq!(ccas.get("Choir").unwrap().kind, "Performing\nArts");
    assert_eq!(ccas.get("Chess").unwrap().kind, "Clubs");
}

#[test]
fn report_serializes_with_rejected_rows() {
    let conn = open_db_in_memory().unwrap();

    let report = service(&conn)
        .import_students("student_name,class_id,year_enrolled\nBen Ong,J2-01,soon\n")
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["added"], 0);
    assert_eq!(json["classes_created"], 0);
    assert_eq!(json["rejected"][0]["line"], 2);
    assert!(json["rejected"][0]["reason"]
        .as_str()
        .unwrap()
        .contains("soon"));
}

#[test]
fn missing_header_column_aborts_before_any_row() {
    let conn = open_db_in_memory().unwrap();

    let err = service(&conn)
        .import_students("student_name,year_enrolled\nBen,2022\n")
        .unwrap_err();
    assert!(matches!(err, ImportError::MissingColumn("class_id")));

    let err = service(&conn).import_ccas("   \n").unwrap_err();
    assert!(matches!(err, ImportError::EmptyInput));
    assert!(SqliteCcaRepository::try_new(&conn)
        .unwrap()
        .list_all()
        .unwrap()
        .is_empty());
}

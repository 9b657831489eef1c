use rusqlite::Connection;
use schoolrec_core::db::open_db_in_memory;
use schoolrec_core::{
    CcaInput, CcaMembershipInput, CcaRepository, ClassInput, ClassRepository, EntityKind,
    RepoError, SqliteCcaRepository, SqliteClassRepository, SqliteStudentRepository,
    StudentInput, StudentRepository,
};

fn seed(conn: &Connection) {
    let classes = SqliteClassRepository::try_new(conn).unwrap();
    let students = SqliteStudentRepository::try_new(conn).unwrap();
    let ccas = SqliteCcaRepository::try_new(conn).unwrap();

    classes
        .add(&ClassInput {
            name: "J2-01".to_string(),
            level: "J2".to_string(),
        })
        .unwrap();
    for name in ["Ben", "Cara"] {
        students
            .add(&StudentInput {
                name: name.to_string(),
                age: 18,
                year_enrolled: 2022,
                grad_year: 2023,
                class_name: "J2-01".to_string(),
            })
            .unwrap();
    }
    ccas.add(&cca("Choir", "Performing")).unwrap();
    ccas.add(&cca("Chess Club", "Clubs")).unwrap();
}

fn cca(name: &str, kind: &str) -> CcaInput {
    CcaInput {
        name: name.to_string(),
        kind: kind.to_string(),
    }
}

fn membership(student_name: &str, cca_name: &str, role: &str) -> CcaMembershipInput {
    CcaMembershipInput {
        student_name: student_name.to_string(),
        cca_name: cca_name.to_string(),
        role: role.to_string(),
    }
}

#[test]
fn duplicate_cca_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    match ccas.add(&cca("Choir", "Music")).unwrap_err() {
        RepoError::AlreadyExists { entity, name } => {
            assert_eq!(entity, EntityKind::Cca);
            assert_eq!(name, "Choir");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ccas.list_all().unwrap().len(), 2);
}

#[test]
fn get_matches_by_substring() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    let record = ccas.get("Chess").unwrap();
    assert_eq!(record.name, "Chess Club");
    assert_eq!(record.kind, "Clubs");
    assert!(matches!(
        ccas.get("Band").unwrap_err(),
        RepoError::NotFound {
            entity: EntityKind::Cca,
            ..
        }
    ));
}

#[test]
fn add_student_then_get_student_surfaces_role() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    ccas.add_student(&membership("Ben", "Choir", "Member"))
        .unwrap();
    ccas.add_student(&membership("Ben", "Chess", "Captain"))
        .unwrap();

    let all = ccas.get_student("Ben", None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].cca_name, "Choir");
    assert_eq!(all[0].role, "Member");
    assert_eq!(all[0].student_name, None);
    assert_eq!(all[1].cca_name, "Chess Club");
    assert_eq!(all[1].role, "Captain");

    let narrowed = ccas.get_student("Be", Some("Choir")).unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].student_name.as_deref(), Some("Ben"));
}

#[test]
fn duplicate_membership_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    ccas.add_student(&membership("Ben", "Choir", "Member"))
        .unwrap();
    assert!(matches!(
        ccas.add_student(&membership("Ben", "Choir", "Member"))
            .unwrap_err(),
        RepoError::AlreadyExists {
            entity: EntityKind::CcaMembership,
            ..
        }
    ));
}

#[test]
fn add_student_with_unknown_names_is_invalid_reference() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    assert!(matches!(
        ccas.add_student(&membership("Zed", "Choir", "Member"))
            .unwrap_err(),
        RepoError::InvalidReference {
            entity: EntityKind::Student,
            ..
        }
    ));
    assert!(matches!(
        ccas.add_student(&membership("Ben", "Band", "Member"))
            .unwrap_err(),
        RepoError::InvalidReference {
            entity: EntityKind::Cca,
            ..
        }
    ));
}

#[test]
fn update_student_changes_role_only() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    ccas.add_student(&membership("Ben", "Choir", "Member"))
        .unwrap();
    ccas.update_student(&membership("Be", "Choir", "Section Leader"))
        .unwrap();

    let memberships = ccas.get_student("Ben", None).unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].cca_name, "Choir");
    assert_eq!(memberships[0].role, "Section Leader");
}

#[test]
fn update_student_requires_exact_cca_and_existing_membership() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    ccas.add_student(&membership("Ben", "Choir", "Member"))
        .unwrap();

    assert!(matches!(
        ccas.update_student(&membership("Ben", "Cho", "Lead"))
            .unwrap_err(),
        RepoError::InvalidReference {
            entity: EntityKind::Cca,
            ..
        }
    ));
    assert!(matches!(
        ccas.update_student(&membership("Ben", "Chess Club", "Lead"))
            .unwrap_err(),
        RepoError::NotFound {
            entity: EntityKind::CcaMembership,
            ..
        }
    ));
}

#[test]
fn update_rewrites_name_and_type() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    ccas.add_student(&membership("Ben", "Choir", "Member"))
        .unwrap();
    ccas.update("Choir", &cca("Chamber Choir", "Music")).unwrap();

    let record = ccas.get("Chamber").unwrap();
    assert_eq!(record.kind, "Music");
    assert_eq!(
        ccas.get_student("Ben", None).unwrap()[0].cca_name,
        "Chamber Choir"
    );

    assert!(matches!(
        ccas.update("Chamber Choir", &cca("Chess Club", "Clubs"))
            .unwrap_err(),
        RepoError::AlreadyExists { .. }
    ));
    assert!(matches!(
        ccas.update("Choir", &cca("Choir", "Music")).unwrap_err(),
        RepoError::NotFound { .. }
    ));
}

#[test]
fn delete_cascades_memberships() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    ccas.add_student(&membership("Ben", "Choir", "Member"))
        .unwrap();
    ccas.delete("Choir").unwrap();

    assert!(matches!(
        ccas.get_student("Ben", None).unwrap_err(),
        RepoError::NotFound {
            entity: EntityKind::CcaMembership,
            ..
        }
    ));
    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM \"Students-CCAs\";", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(links, 0);
    assert!(matches!(
        ccas.delete("Choir").unwrap_err(),
        RepoError::NotFound { .. }
    ));
}

#[test]
fn delete_student_removes_one_membership() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    ccas.add_student(&membership("Ben", "Choir", "Member"))
        .unwrap();
    ccas.add_student(&membership("Cara", "Choir", "Member"))
        .unwrap();

    assert!(matches!(
        ccas.delete_student("Ben", "Cho").unwrap_err(),
        RepoError::InvalidReference { .. }
    ));
    assert!(matches!(
        ccas.delete_student("Ben", "Chess Club").unwrap_err(),
        RepoError::NotFound { .. }
    ));

    ccas.delete_student("Ben", "Choir").unwrap();
    assert!(ccas.get_student("Ben", None).is_err());
    assert_eq!(ccas.get_student("Cara", None).unwrap().len(), 1);
}

#[test]
fn records_serialize_kind_as_type_and_omit_unnarrowed_student() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let ccas = SqliteCcaRepository::try_new(&conn).unwrap();

    let record = serde_json::to_value(ccas.get("Choir").unwrap()).unwrap();
    assert_eq!(record["type"], "Performing");
    assert_eq!(record["name"], "Choir");

    ccas.add_student(&membership("Ben", "Choir", "Member"))
        .unwrap();
    let memberships = serde_json::to_value(ccas.get_student("Ben", None).unwrap()).unwrap();
    assert!(memberships[0].get("student_name").is_none());
}

use hashbag::HashBag;

use crate::{DirStorage, Engine, ErrorKind, MemoryStorage, Outcome, Relation, Storage};

fn setup_db() -> Engine<MemoryStorage> {
    let student = Relation::with_tuples(
        "STUDENT",
        ["nome", "cognome"],
        [["guido", "michieletto"], ["antonio", "friselle"]],
    )
    .unwrap();
    let abita = Relation::with_tuples(
        "abita",
        ["Persona", "Citta"],
        [["anna", "roma"], ["bruno", "milano"], ["carla", "torino"]],
    )
    .unwrap();
    let lavora = Relation::with_tuples(
        "lavora",
        ["Persona", "Azienda"],
        [["anna", "acme"], ["bruno", "acme"], ["carla", "initech"]],
    )
    .unwrap();
    let ha_sede_in = Relation::with_tuples(
        "ha_sede_in",
        ["Societa", "Sede"],
        [["acme", "roma"], ["initech", "torino"]],
    )
    .unwrap();

    Engine::new(MemoryStorage::from_iter([student, abita, lavora, ha_sede_in]))
}

fn run(engine: &mut Engine<MemoryStorage>, code: &str) -> Relation {
    match engine.execute(code).unwrap() {
        Outcome::Relation(relation) => relation,
        Outcome::Inserted => panic!("expected a relation from {:?}", code),
    }
}

fn test_query(code: &str, fields: &[&str], expected: &[&[&str]]) {
    let mut engine = setup_db();
    let relation = run(&mut engine, code);
    println!("{}", relation);

    assert_eq!(relation.fields(), fields);
    let result_rows = HashBag::from_iter(
        relation
            .tuples()
            .iter()
            .map(|t| t.iter().map(String::as_str).collect::<Vec<_>>()),
    );
    let expected = HashBag::from_iter(expected.iter().map(|x| x.to_vec()));
    assert_eq!(result_rows, expected);
}

fn test_error(code: &str, kind: ErrorKind) {
    let mut engine = setup_db();
    let err = engine.execute(code).unwrap_err();
    assert_eq!(err.kind(), kind, "{}", err);
}

#[test]
fn test_select_star() {
    test_query(
        "SELECT * FROM STUDENT",
        &["nome", "cognome"],
        &[&["guido", "michieletto"], &["antonio", "friselle"]],
    );
}

#[test]
fn test_select_where_literal() {
    test_query(
        "SELECT * FROM STUDENT WHERE nome='antonio'",
        &["nome", "cognome"],
        &[&["antonio", "friselle"]],
    );
}

#[test]
fn test_select_where_is_case_sensitive() {
    test_query(
        "SELECT * FROM STUDENT WHERE nome = 'Antonio'",
        &["nome", "cognome"],
        &[],
    );
}

#[test]
fn test_select_where_conjunction() {
    test_query(
        "select * from STUDENT where nome <> 'antonio' and cognome <> 'rossi'",
        &["nome", "cognome"],
        &[&["guido", "michieletto"]],
    );
}

#[test]
fn test_projection_reorders() {
    test_query(
        "SELECT cognome, nome FROM STUDENT",
        &["cognome", "nome"],
        &[&["michieletto", "guido"], &["friselle", "antonio"]],
    );
}

#[test]
fn test_insert_then_project() {
    let mut engine = setup_db();
    let outcome = engine
        .execute("INSERT INTO STUDENT VALUES ('maria','rossi')")
        .unwrap();
    assert_eq!(outcome, Outcome::Inserted);

    let relation = run(&mut engine, "SELECT nome FROM STUDENT");
    assert_eq!(relation.fields(), &["nome"]);
    let names = HashBag::from_iter(relation.tuples().iter().map(|t| t[0].as_str()));
    assert_eq!(names, HashBag::from_iter(["guido", "antonio", "maria"]));
}

#[test]
fn test_projection_coalesces_duplicates() {
    let mut engine = setup_db();
    engine
        .execute("INSERT INTO STUDENT VALUES ('guido', 'rossi')")
        .unwrap();
    let relation = run(&mut engine, "SELECT nome FROM STUDENT");
    assert_eq!(relation.len(), 2);
}

#[test]
fn test_join_on() {
    test_query(
        "SELECT * FROM abita JOIN lavora ON Persona = Persona WHERE Azienda = 'acme'",
        &["abita.Persona", "Citta", "lavora.Persona", "Azienda"],
        &[
            &["anna", "roma", "anna", "acme"],
            &["bruno", "milano", "bruno", "acme"],
        ],
    );
}

#[test]
fn test_chained_joins_then_projection_then_selection() {
    test_query(
        "SELECT abita.Persona, Citta, Sede FROM abita \
         JOIN lavora ON Persona = Persona \
         JOIN ha_sede_in ON Azienda = Societa \
         WHERE Citta = Sede",
        &["abita.Persona", "Citta", "Sede"],
        &[&["anna", "roma", "roma"], &["carla", "torino", "torino"]],
    );
}

#[test]
fn test_join_with_not_equal() {
    test_query(
        "SELECT Persona, Sede FROM lavora JOIN ha_sede_in ON Azienda <> Societa",
        &["Persona", "Sede"],
        &[&["anna", "torino"], &["bruno", "torino"], &["carla", "roma"]],
    );
}

#[test]
fn test_where_referencing_projected_out_field() {
    test_error(
        "SELECT nome FROM STUDENT WHERE cognome = 'friselle'",
        ErrorKind::Schema,
    );
}

#[test]
fn test_errors() {
    test_error("SELECT * FROM NOBODY", ErrorKind::NotFound);
    test_error("SELECT * STUDENT", ErrorKind::Parse);
    test_error("UPDATE STUDENT SET nome = 'x'", ErrorKind::Parse);
    test_error("SELECT eta FROM STUDENT", ErrorKind::Schema);
    test_error("SELECT * FROM STUDENT WHERE nome = 'x", ErrorKind::Parse);
    test_error(
        "SELECT * FROM abita JOIN lavora ON Citta = Citta",
        ErrorKind::Schema,
    );
    test_error("INSERT INTO STUDENT VALUES ('a', 'b', 'c')", ErrorKind::Schema);
    test_error("INSERT INTO NOBODY VALUES ('a')", ErrorKind::NotFound);
}

#[test]
fn test_failed_command_does_not_poison_engine() {
    let mut engine = setup_db();
    assert!(engine.execute("SELECT * FROM NOBODY").is_err());
    let relation = run(&mut engine, "SELECT * FROM STUDENT");
    assert_eq!(relation.len(), 2);
}

#[test]
fn test_lineage_names() {
    let mut engine = setup_db();
    let relation = run(&mut engine, "SELECT nome FROM STUDENT WHERE nome = 'guido'");
    assert_eq!(relation.name(), "selection_projection_STUDENT");

    let relation = run(&mut engine, "SELECT * FROM abita JOIN lavora ON Persona = Persona");
    assert_eq!(relation.name(), "join_abita_lavora");
}

#[test]
fn test_algebra_pipeline() {
    // People who do not work in the city they live in.
    let engine = setup_db();
    let storage = engine.storage();
    let abita = storage.load("abita").unwrap().unwrap();
    let lavora = storage.load("lavora").unwrap().unwrap();
    let ha_sede_in = storage.load("ha_sede_in").unwrap().unwrap();

    let same_city = abita
        .natural_join(&lavora)
        .unwrap()
        .natural_join(&ha_sede_in.rename(&["Azienda", "citta_azienda"]).unwrap())
        .unwrap()
        .selection("Citta = citta_azienda")
        .unwrap()
        .projection(&["Persona"])
        .unwrap();
    let result = lavora
        .projection(&["Persona"])
        .unwrap()
        .difference(&same_city)
        .unwrap();

    assert_eq!(result.tuples(), &[vec!["bruno".to_owned()]]);
}

#[test]
fn test_insert_persists_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = DirStorage::new(dir.path());
    let student =
        Relation::with_tuples("STUDENT", ["nome", "cognome"], [["guido", "michieletto"]]).unwrap();
    storage.save(&student).unwrap();

    let mut engine = Engine::new(storage);
    engine
        .execute("INSERT INTO STUDENT VALUES (maria, rossi)")
        .unwrap();

    let text = std::fs::read_to_string(dir.path().join("STUDENT.csv")).unwrap();
    assert_eq!(text, "nome,cognome\nguido,michieletto\nmaria,rossi\n");

    let fresh = Engine::new(DirStorage::new(dir.path()));
    let relation = fresh.storage().load("STUDENT").unwrap().unwrap();
    assert_eq!(relation.len(), 2);
}

#[test]
fn test_insert_rejects_values_the_store_cannot_hold() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = DirStorage::new(dir.path());
    let student =
        Relation::with_tuples("STUDENT", ["nome", "cognome"], [["guido", "michieletto"]]).unwrap();
    storage.save(&student).unwrap();

    let mut engine = Engine::new(storage);
    let err = engine
        .execute("INSERT INTO STUDENT VALUES ('maria,anna', 'rossi')")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    let err = engine
        .execute("INSERT INTO STUDENT VALUES ('maria\nanna', 'rossi')")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);

    let text = std::fs::read_to_string(dir.path().join("STUDENT.csv")).unwrap();
    assert_eq!(text, "nome,cognome\nguido,michieletto\n");
}

#[test]
fn test_insert_empty_value_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = DirStorage::new(dir.path());
    storage
        .save(&Relation::with_tuples("R", ["a"], [["x"]]).unwrap())
        .unwrap();

    let mut engine = Engine::new(storage);
    engine.execute("INSERT INTO R VALUES ('')").unwrap();

    let fresh = DirStorage::new(dir.path());
    assert_eq!(fresh.load("R").unwrap().unwrap().len(), 2);
}

#[test]
fn test_qualified_field_after_projection() {
    test_query(
        "SELECT nome FROM STUDENT WHERE STUDENT.nome = 'guido'",
        &["nome"],
        &[&["guido"]],
    );
}

#[test]
fn test_repeated_projection_field() {
    test_error("SELECT nome, nome FROM STUDENT", ErrorKind::Schema);
}

#[test]
fn test_non_ascii_field_names() {
    let mut engine = Engine::new(MemoryStorage::from_iter([Relation::with_tuples(
        "abita",
        ["Persona", "Città"],
        [["anna", "Forlì"], ["bruno", "Cantù"]],
    )
    .unwrap()]));
    let relation = run(&mut engine, "SELECT * FROM abita WHERE Città = 'Cantù'");
    assert_eq!(relation.fields(), &["Persona", "Città"]);
    assert_eq!(relation.tuples(), &[vec!["bruno".to_owned(), "Cantù".to_owned()]]);
}

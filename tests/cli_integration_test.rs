use assert_cmd::Command;
use mockito::Matcher;
use predicates::str::contains;
use std::fs;

#[test]
fn test_cli_requires_tex_file() {
    let mut cmd = Command::cargo_bin("bibads").unwrap();
    cmd.assert().failure();
}

#[test]
fn test_cli_missing_directive_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("paper.tex"), "\\cite{2009MNRAS.399..683J}").unwrap();

    let mut cmd = Command::cargo_bin("bibads").unwrap();
    cmd.current_dir(dir.path())
        .arg("paper.tex")
        .assert()
        .failure()
        .stderr(contains("No bib file name found"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_cli_writes_bib_next_to_working_directory() {
    let mut server = mockito::Server::new();
    let good = server
        .mock("GET", "/cgi-bin/nph-bib_query")
        .match_query(Matcher::UrlEncoded("bibcode".into(), "1980lssu.book.....P".into()))
        .with_status(200)
        .with_body(concat!(
            "Retrieved 1 abstracts\n\n@BOOK{1980lssu.book.....P,\n",
            "   title = \"{The large-scale structure of the universe}\"\n}\n",
        ))
        .create();
    let bad = server
        .mock("GET", "/cgi-bin/nph-bib_query")
        .match_query(Matcher::UrlEncoded("bibcode".into(), "bogus".into()))
        .with_status(404)
        .create();

    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("paper.tex"),
        "% bibalias peeb80 1980lssu.book.....P\n\\cite{peeb80, bogus}\n\\bibliography{refs.bib}\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("bibads").unwrap();
    cmd.current_dir(dir.path())
        .arg("paper.tex")
        .arg("--ads-url")
        .arg(server.url())
        .assert()
        .success()
        .stdout(contains("1980lssu.book.....P   peeb80            ...   OK"))
        .stdout(contains("bogus                                   ...   404 Not Found"));

    good.assert();
    bad.assert();
    let bib = fs::read_to_string(dir.path().join("refs.bib")).unwrap();
    assert!(bib.contains("@BOOK{peeb80,"));
    assert!(!bib.contains("bogus"));
}

#[test]
fn test_cli_nocache_flag_is_accepted() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/cgi-bin/nph-bib_query")
        .match_query(Matcher::UrlEncoded("bibcode".into(), "2009MNRAS.399..683J".into()))
        .with_status(200)
        .with_body("@ARTICLE{2009MNRAS.399..683J,\n   note = {fresh}\n}\n")
        .expect(1)
        .create();

    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("paper.tex"),
        "\\cite{2009MNRAS.399..683J}\n\\bibliography{out.bib}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("out.bib"),
        "@ARTICLE{2009MNRAS.399..683J,\n   note = {cached}\n}\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("bibads").unwrap();
    cmd.current_dir(dir.path())
        .args(["--nocache", "--ads-url", &server.url(), "paper.tex"])
        .assert()
        .success();

    mock.assert();
    let bib = fs::read_to_string(dir.path().join("out.bib")).unwrap();
    assert!(bib.contains("fresh"));
}

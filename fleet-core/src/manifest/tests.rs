use super::*;
use std::collections::BTreeMap;

const CANONICAL_MANIFEST: &str = r#"version: "3.8"
services:
  web:
    image: nginx:alpine
    ports:
      - 8080:80
    environment:
      TZ: Asia/Shanghai
      EMPTY: null
    healthcheck:
      test:
        - CMD
        - curl
      interval: 30s
  worker:
    image: busybox
    command:
      - sh
      - -c
      - echo ready
    privileged: true
    replicas: 2
networks:
  default:
    name: fleet
"#;

/// 指令集合（忽略顺序），用于比较两次转换的结果
fn directive_set(manifest: &Manifest) -> BTreeMap<String, String> {
    let service = &manifest.services[0];
    let mut set = BTreeMap::new();
    set.insert("__name".to_string(), service.name.clone());
    for (key, value) in &service.directives {
        set.insert(
            key.as_str().unwrap().to_string(),
            serde_json::to_string(value).unwrap(),
        );
    }
    set
}

#[test]
fn test_serialize_is_stable_for_canonical_text() {
    let manifest = parse(CANONICAL_MANIFEST).unwrap();
    assert_eq!(manifest.service_names(), vec!["web", "worker"]);
    assert_eq!(manifest.header.len(), 1);
    assert_eq!(manifest.footer.len(), 1);
    assert_eq!(serialize(&manifest), CANONICAL_MANIFEST);
}

#[test]
fn test_parse_serialize_round_trip() {
    let text = r#"
services:
  api:
    build: ./api
    environment:
      - "QUOTED=with spaces"
      - PORT=3000
    ports:
      - target: 3000
        published: 80
        protocol: udp
    labels:
      com.example.flag: "true"
      com.example.count: "10"
    command: ["node", "server.js"]
    stop_grace_period: 1m30s
  cache:
    image: "redis:7"
volumes:
  data: {}
"#;
    let manifest = parse(text).unwrap();
    let reparsed = parse(&serialize(&manifest)).unwrap();
    assert_eq!(reparsed, manifest);

    // 第二次序列化的文本与第一次完全一致（键顺序保留）
    assert_eq!(serialize(&reparsed), serialize(&manifest));
    let api = reparsed.service("api").unwrap();
    let keys: Vec<&str> = api.directives.keys().filter_map(|k| k.as_str()).collect();
    assert_eq!(
        keys,
        vec!["build", "environment", "ports", "labels", "command", "stop_grace_period"]
    );
}

#[test]
fn test_parse_rejects_invalid_documents() {
    assert!(matches!(parse("services: [web"), Err(FleetError::Parse(_))));
    assert!(matches!(parse("- a\n- b\n"), Err(FleetError::Parse(_))));
    assert!(matches!(parse(""), Err(FleetError::Parse(_))));
    assert!(matches!(
        parse("services:\n  - web\n"),
        Err(FleetError::Parse(_))
    ));
    assert!(matches!(
        parse("services:\n  web: nginx\n"),
        Err(FleetError::Parse(_))
    ));
}

#[test]
fn test_missing_services_section() {
    let manifest = parse("image: nginx\nports:\n  - 80:80\n").unwrap();
    assert!(!manifest.has_services_section());
    assert_eq!(manifest.service_count(), 0);
    assert!(matches!(manifest.validate(), Err(FleetError::Validation(_))));

    let implicit = manifest.into_implicit_service("app");
    assert_eq!(implicit.service_names(), vec!["app"]);
    assert_eq!(implicit.services[0].image(), Some("nginx"));
}

#[test]
fn test_validate_service_names() {
    let manifest = parse("services:\n  _bad:\n    image: nginx\n").unwrap();
    let err = manifest.validate().unwrap_err();
    assert!(err.to_string().contains("_bad"));

    let empty = parse("services: {}\n").unwrap();
    assert!(empty.has_services_section());
    assert!(empty.validate().is_err());

    assert!(parse_for_create("services:\n  web.1:\n    image: nginx\n").is_ok());
    assert!(is_valid_name("my-app_1.0"));
    assert!(!is_valid_name("-app"));
    assert!(!is_valid_name(""));
}

#[test]
fn test_images_are_collected_in_service_order() {
    let manifest = parse(
        "services:\n  a:\n    image: nginx\n  b:\n    build: .\n  c:\n    image: redis\n  d:\n    image: nginx\n",
    )
    .unwrap();
    assert_eq!(manifest.images(), vec!["nginx", "redis"]);
}

#[test]
fn test_run_to_manifest_basic_example() {
    let manifest =
        run_to_manifest("docker run -d --name web -p 8080:80 -e FOO=bar nginx:latest").unwrap();

    assert_eq!(manifest.service_names(), vec!["web"]);
    assert_eq!(
        serialize(&manifest),
        "services:\n  web:\n    ports:\n      - 8080:80\n    environment:\n      - FOO=bar\n    image: nginx:latest\n"
    );

    let commands = manifest_to_run(&manifest).unwrap();
    assert_eq!(
        commands[0].to_string(),
        "docker run -d --name web -p 8080:80 -e FOO=bar nginx:latest"
    );
}

#[test]
fn test_run_to_manifest_rename_keeps_directives() {
    let manifest = run_to_manifest(
        "docker run -p 80:80 -v /srv/www:/usr/share/nginx/html:ro --name site --restart always --network host nginx",
    )
    .unwrap();
    let service = &manifest.services[0];
    assert_eq!(service.name, "site");
    assert_eq!(service.get("ports").unwrap()[0].as_str(), Some("80:80"));
    assert_eq!(
        service.get("volumes").unwrap()[0].as_str(),
        Some("/srv/www:/usr/share/nginx/html:ro")
    );
    assert_eq!(service.get("restart").unwrap().as_str(), Some("always"));
    assert_eq!(service.get("network_mode").unwrap().as_str(), Some("host"));
    assert_eq!(service.image(), Some("nginx"));
}

#[test]
fn test_run_to_manifest_generic_flags() {
    let manifest = run_to_manifest(
        "docker run --memory 512m --rm --read-only --log-driver=json-file --cpus 1.5 --restart no --restart on-failure redis:7",
    )
    .unwrap();
    let service = &manifest.services[0];
    assert_eq!(service.name, "app");
    assert_eq!(service.get("memory").unwrap().as_str(), Some("512m"));
    assert_eq!(service.get("rm").unwrap().as_bool(), Some(true));
    assert_eq!(service.get("read_only").unwrap().as_bool(), Some(true));
    assert_eq!(service.get("log_driver").unwrap().as_str(), Some("json-file"));
    assert_eq!(service.get("cpus").unwrap().as_str(), Some("1.5"));
    // 后出现者生效
    assert_eq!(service.get("restart").unwrap().as_str(), Some("on-failure"));

    let command = manifest_to_run(&manifest).unwrap()[0].to_string();
    assert_eq!(
        command,
        "docker run -d --name app --restart on-failure --memory 512m --rm --read-only --log-driver json-file --cpus 1.5 redis:7"
    );
}

#[test]
fn test_long_flag_without_value_becomes_boolean() {
    let manifest = run_to_manifest("docker run --init --oom-kill-disable --pid host alpine").unwrap();
    let service = &manifest.services[0];
    assert_eq!(service.get("init").unwrap().as_bool(), Some(true));
    assert_eq!(service.get("oom_kill_disable").unwrap().as_bool(), Some(true));
    assert_eq!(service.get("pid").unwrap().as_str(), Some("host"));
    assert_eq!(service.image(), Some("alpine"));
}

#[test]
fn test_unknown_short_flags_are_dropped() {
    let manifest =
        run_to_manifest(r#"docker run -it -u 1000 --name shell ubuntu:22.04 bash -lc "echo hi""#)
            .unwrap();
    let service = &manifest.services[0];
    assert_eq!(service.name, "shell");
    assert_eq!(service.image(), Some("ubuntu:22.04"));
    assert!(!service.contains("user"));
    assert_eq!(service.directives.len(), 2);

    let command = manifest_to_run(&manifest).unwrap()[0].to_string();
    assert_eq!(
        command,
        "docker run -d --name shell ubuntu:22.04 bash -lc 'echo hi'"
    );
}

#[test]
fn test_attached_short_values() {
    let manifest = run_to_manifest("docker run -p8080:80 -eMODE=prod nginx").unwrap();
    let service = &manifest.services[0];
    assert_eq!(service.get("ports").unwrap()[0].as_str(), Some("8080:80"));
    assert_eq!(service.get("environment").unwrap()[0].as_str(), Some("MODE=prod"));
}

#[test]
fn test_run_to_manifest_errors() {
    assert!(matches!(
        run_to_manifest("docker ps -a"),
        Err(FleetError::Parse(_))
    ));
    assert!(matches!(run_to_manifest("podman run nginx"), Err(FleetError::Parse(_))));
    assert!(matches!(run_to_manifest(""), Err(FleetError::Parse(_))));
    assert!(matches!(
        run_to_manifest("docker run -e 'A=1 nginx"),
        Err(FleetError::Parse(_))
    ));
    let err = run_to_manifest("docker run -d --name").unwrap_err();
    assert!(err.to_string().contains("--name"));
    assert!(matches!(
        run_to_manifest("docker run -d -p 80:80"),
        Err(FleetError::Parse(_))
    ));
}

#[test]
fn test_run_to_manifest_rejects_invalid_container_names() {
    for command in [
        "docker run --name 'bad name' nginx",
        "docker run --name= nginx",
        "docker run --name -web nginx",
        "docker run --name=.hidden nginx",
    ] {
        let err = run_to_manifest(command).unwrap_err();
        assert!(matches!(err, FleetError::Parse(_)), "{command}: {err}");
        assert!(err.to_string().contains("invalid container name"), "{command}: {err}");
    }

    let manifest = run_to_manifest("docker run --name web.v2_1 nginx").unwrap();
    assert_eq!(manifest.services[0].name, "web.v2_1");
    assert!(manifest.validate().is_ok());
}

#[test]
fn test_quoted_values_survive_round_trip() {
    let original = r#"docker run --name app -e "GREETING=hello world" -e 'QUOTE=it'"'"'s' -v "/my data:/data" busybox"#;
    let manifest = run_to_manifest(original).unwrap();
    let service = &manifest.services[0];
    assert_eq!(
        service.get("environment").unwrap()[0].as_str(),
        Some("GREETING=hello world")
    );
    assert_eq!(service.get("environment").unwrap()[1].as_str(), Some("QUOTE=it's"));

    let regenerated = manifest_to_run(&manifest).unwrap()[0].to_string();
    let again = run_to_manifest(&regenerated).unwrap();
    assert_eq!(directive_set(&again), directive_set(&manifest));
}

#[test]
fn test_run_manifest_run_preserves_flag_set() {
    let commands = [
        "docker run -d --name web -p 8080:80 -e FOO=bar nginx:latest",
        "docker run --restart always -e A=1 -p 1:1 -p 2:2 --name multi -v a:/a --network bridge img:1",
        "docker run --rm --memory=256m --hostname box alpine sleep 10",
        "docker run -d --privileged --name priv docker:dind",
    ];
    for command in commands {
        let manifest = run_to_manifest(command).unwrap();
        let regenerated = manifest_to_run(&manifest).unwrap();
        assert_eq!(regenerated.len(), 1);
        let again = run_to_manifest(&regenerated[0].to_string()).unwrap();
        assert_eq!(directive_set(&again), directive_set(&manifest), "{command}");
    }
}

#[test]
fn test_manifest_to_run_canonical_order() {
    let text = r#"
version: "3.8"
services:
  db:
    image: postgres:16
    environment:
      POSTGRES_PASSWORD: secret
      DEBUG:
    volumes:
      - source: pgdata
        target: /var/lib/postgresql/data
  web:
    image: nginx:alpine
    depends_on:
      - db
    ports:
      - target: 80
        published: 8080
      - "443:443"
    networks:
      - frontend
    restart: unless-stopped
    privileged: true
    dns:
      - 8.8.8.8
      - 1.1.1.1
    mem_limit: 512m
    read_only: true
    tty: false
    healthcheck:
      test: ["CMD", "true"]
"#;
    let commands = compose_text_to_run(text).unwrap();
    assert_eq!(
        commands,
        vec![
            "docker run -d --name db -v pgdata:/var/lib/postgresql/data -e POSTGRES_PASSWORD=secret -e DEBUG postgres:16".to_string(),
            "docker run -d --name web -p 8080:80 -p 443:443 --network frontend --restart unless-stopped --dns 8.8.8.8 --dns 1.1.1.1 --privileged --mem-limit 512m --read-only nginx:alpine\n# web depends on: db".to_string(),
        ]
    );
}

#[test]
fn test_manifest_to_run_network_and_workdir() {
    let text = r#"
services:
  job:
    image: python:3.12
    working_dir: /app
    user: "1000:1000"
    hostname: runner
    networks:
      backend:
        aliases: [job]
    network_mode: none
    command: python main.py --verbose
"#;
    let commands = compose_text_to_run(text).unwrap();
    assert_eq!(
        commands[0],
        "docker run -d --name job --network none --workdir /app --user 1000:1000 --hostname runner python:3.12 python main.py --verbose"
    );

    let fallback = compose_text_to_run(
        "services:\n  job:\n    image: busybox\n    networks:\n      backend: {}\n      other: {}\n",
    )
    .unwrap();
    assert_eq!(
        fallback[0],
        "docker run -d --name job --network backend busybox"
    );
}

#[test]
fn test_manifest_to_run_without_services_section() {
    let commands = compose_text_to_run("version: '3'\nimage: nginx\nports:\n  - 80:80\n").unwrap();
    assert_eq!(commands, vec!["docker run -d --name app -p 80:80 nginx".to_string()]);
}

#[test]
fn test_manifest_to_run_errors() {
    let err = compose_text_to_run(
        "services:\n  ok:\n    image: nginx\n  broken:\n    ports:\n      - 80:80\n",
    )
    .unwrap_err();
    assert!(err.to_string().contains("broken"));

    let err = compose_text_to_run("services: {}\n").unwrap_err();
    assert!(err.to_string().contains("nothing to convert"));

    assert!(matches!(
        compose_text_to_run("services: [oops"),
        Err(FleetError::Parse(_))
    ));
    assert!(compose_text_to_run("   ").is_err());
}

#[test]
fn test_run_to_compose_text() {
    let text = run_to_compose_text("docker run --name cache -p 6379:6379 redis:7 redis-server --save 60 1")
        .unwrap();
    assert_eq!(
        text,
        "services:\n  cache:\n    ports:\n      - 6379:6379\n    image: redis:7\n    command:\n      - redis-server\n      - --save\n      - \"60\"\n      - \"1\"\n"
    );
    assert!(parse_for_create(&text).is_ok());
}
